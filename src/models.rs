//! Core data types for the scheduling system.
//!
//! This module defines the records the rest of the system moves around:
//! - Patient: caller-supplied patient record with a clinical priority level
//! - Appointment: immutable booking snapshot, decoupled from the Patient
//! - Doctor: a doctor and their per-time-slot schedule

use std::collections::BTreeMap;

use chrono::NaiveTime;

use crate::error::ScheduleError;
use crate::slot::Slot;

/// Capacity assigned to a slot created lazily by a booking or a snapshot
/// replay that references an unknown time label.
pub const DEFAULT_SLOT_CAPACITY: usize = 2;

/// A patient requesting care.
///
/// `priority_level` is a non-negative clinical urgency: lower values are
/// more urgent and are served first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    pub patient_id: String,
    pub name: String,
    pub priority_level: u32,
}

impl Patient {
    /// Create a new patient with validation.
    pub fn new(
        patient_id: impl Into<String>,
        name: impl Into<String>,
        priority_level: u32,
    ) -> Result<Self, ScheduleError> {
        let patient_id = patient_id.into();
        let name = name.into();
        if patient_id.is_empty() {
            return Err(ScheduleError::InvalidInput(
                "patient ID cannot be empty".to_string(),
            ));
        }
        if name.is_empty() {
            return Err(ScheduleError::InvalidInput(
                "patient name cannot be empty".to_string(),
            ));
        }
        Ok(Patient {
            patient_id,
            name,
            priority_level,
        })
    }
}

/// A confirmed booking.
///
/// Created at booking time as a snapshot of the patient's fields; it is a
/// decoupled copy, not a live reference to the Patient record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub doctor_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub time_slot: String,
    pub priority_level: u32,
}

impl Appointment {
    pub fn new(doctor_id: &str, patient: &Patient, time_slot: &str) -> Self {
        Appointment {
            doctor_id: doctor_id.to_string(),
            patient_id: patient.patient_id.clone(),
            patient_name: patient.name.clone(),
            time_slot: time_slot.to_string(),
            priority_level: patient.priority_level,
        }
    }
}

/// A doctor and their schedule, keyed by time-slot label.
///
/// The schedule is an ordered map so that listing and snapshot rewrites walk
/// slots in a stable order.
#[derive(Debug, Clone)]
pub struct Doctor {
    pub doctor_id: String,
    pub name: String,
    pub specialty: String,
    schedule: BTreeMap<String, Slot>,
}

impl Doctor {
    pub fn new(
        doctor_id: impl Into<String>,
        name: impl Into<String>,
        specialty: impl Into<String>,
    ) -> Self {
        Doctor {
            doctor_id: doctor_id.into(),
            name: name.into(),
            specialty: specialty.into(),
            schedule: BTreeMap::new(),
        }
    }

    pub fn schedule(&self) -> &BTreeMap<String, Slot> {
        &self.schedule
    }

    pub fn slot(&self, time_slot: &str) -> Option<&Slot> {
        self.schedule.get(time_slot)
    }

    pub fn slot_mut(&mut self, time_slot: &str) -> Option<&mut Slot> {
        self.schedule.get_mut(time_slot)
    }

    /// Get the slot for a time label, creating it with the default capacity
    /// the first time the label is seen.
    pub fn slot_or_create(&mut self, time_slot: &str) -> &mut Slot {
        self.schedule
            .entry(time_slot.to_string())
            .or_insert_with(|| Slot::new(time_slot, DEFAULT_SLOT_CAPACITY))
    }

    /// Total booked appointments across all slots.
    pub fn booked_count(&self) -> usize {
        self.schedule.values().map(|s| s.appointments().len()).sum()
    }
}

/// Check a time-slot label against the 24-hour `HH:MM` contract.
///
/// The label must be exactly five characters with a colon in the middle;
/// anything chrono cannot parse as a time of day is rejected.
pub fn validate_time_label(label: &str) -> Result<(), ScheduleError> {
    let bytes = label.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return Err(ScheduleError::InvalidTimeSlot(label.to_string()));
    }
    NaiveTime::parse_from_str(label, "%H:%M")
        .map(|_| ())
        .map_err(|_| ScheduleError::InvalidTimeSlot(label.to_string()))
}

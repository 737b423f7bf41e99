//! Capacity-bounded time slot.
//!
//! A slot owns two collections: the booked appointments (insertion order
//! preserved) and a FIFO waiting list, both bounded by the same capacity.
//! The slot knows nothing about the triage queue or persistence; side
//! effects stay inside its own collections.

use std::collections::VecDeque;

use crate::models::{Appointment, Patient};

#[derive(Debug, Clone)]
pub struct Slot {
    label: String,
    capacity: usize,
    appointments: Vec<Appointment>,
    waiting: VecDeque<Patient>,
}

impl Slot {
    pub fn new(label: impl Into<String>, capacity: usize) -> Self {
        Slot {
            label: label.into(),
            capacity,
            appointments: Vec::new(),
            waiting: VecDeque::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Booked appointments in insertion order.
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    /// Waiting patients, head first.
    pub fn waiting(&self) -> &VecDeque<Patient> {
        &self.waiting
    }

    pub fn is_full(&self) -> bool {
        self.appointments.len() >= self.capacity
    }

    /// Book an appointment if the slot has room.
    ///
    /// Appends to the end of the booked list and returns true; a full slot
    /// is left untouched and returns false.
    pub fn book_if_room(&mut self, appointment: Appointment) -> bool {
        if self.is_full() {
            return false;
        }
        self.appointments.push(appointment);
        true
    }

    /// Add a patient to the tail of the waiting list if it has room.
    ///
    /// Returns false when the waiting list is at capacity; the patient is
    /// recorded nowhere in that case and the caller must report the drop.
    pub fn enqueue_waiting(&mut self, patient: Patient) -> bool {
        if self.waiting.len() >= self.capacity {
            return false;
        }
        self.waiting.push_back(patient);
        true
    }

    /// Remove and return the FIFO head of the waiting list, if any.
    pub fn promote_head(&mut self) -> Option<Patient> {
        self.waiting.pop_front()
    }

    /// Remove and return the first booked appointment for a patient.
    pub fn take_by_patient_id(&mut self, patient_id: &str) -> Option<Appointment> {
        let index = self
            .appointments
            .iter()
            .position(|a| a.patient_id == patient_id)?;
        Some(self.appointments.remove(index))
    }

    /// Remove the first booked appointment for a patient; false if absent.
    pub fn remove_by_patient_id(&mut self, patient_id: &str) -> bool {
        self.take_by_patient_id(patient_id).is_some()
    }

    /// Whether the patient still holds a booked appointment in this slot.
    pub fn has_booking_for(&self, patient_id: &str) -> bool {
        self.appointments.iter().any(|a| a.patient_id == patient_id)
    }
}

//! Scheduling orchestration.
//!
//! `Scheduler` owns the whole mutable state of the system: the doctor
//! directory, the cross-doctor triage queue and the storage handle. Every
//! operation runs to completion before the next is accepted (single caller),
//! and every mutating operation ends by rewriting the appointment snapshot
//! so the durable state matches memory. Not-found failures abort before any
//! mutation.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::error::ScheduleError;
use crate::models::{Appointment, Doctor, Patient};
use crate::slot::Slot;
use crate::storage::Storage;
use crate::triage::TriageQueue;

/// Terminal outcome of a schedule request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Booked into the slot; the patient is now eligible to be called.
    Booked,
    /// Slot full; queued on the slot's waiting list.
    Waitlisted,
    /// Slot and waiting list both full; the patient was recorded nowhere.
    WaitlistFull,
}

pub struct Scheduler {
    doctors: BTreeMap<String, Doctor>,
    triage: TriageQueue,
    storage: Storage,
}

impl Scheduler {
    /// Rebuild the in-memory state from the doctor log and the appointment
    /// snapshot.
    ///
    /// Snapshot lines are replayed in file order: slots are auto-created
    /// with the default capacity and triage entries get fresh sequential
    /// orders, so cross-restart tie-breaking is only as fair as the file's
    /// line order. Lines naming an unknown doctor, or exceeding a slot's
    /// capacity, are skipped with a warning.
    pub fn load(storage: Storage) -> Result<Self, ScheduleError> {
        let mut doctors: BTreeMap<String, Doctor> = BTreeMap::new();
        for record in storage.load_doctors()? {
            doctors
                .entry(record.doctor_id.clone())
                .or_insert_with(|| Doctor::new(record.doctor_id, record.name, record.specialty));
        }

        let mut triage = TriageQueue::new();
        for appointment in storage.load_appointments()? {
            let Some(doctor) = doctors.get_mut(&appointment.doctor_id) else {
                warn!(
                    doctor_id = %appointment.doctor_id,
                    patient_id = %appointment.patient_id,
                    "snapshot references unknown doctor, skipping line"
                );
                continue;
            };
            let slot = doctor.slot_or_create(&appointment.time_slot);
            if slot.book_if_room(appointment.clone()) {
                triage.push(&appointment);
            } else {
                warn!(
                    doctor_id = %appointment.doctor_id,
                    time_slot = %appointment.time_slot,
                    patient_id = %appointment.patient_id,
                    "snapshot line exceeds slot capacity, dropping"
                );
            }
        }

        info!(doctors = doctors.len(), pending = triage.len(), "state loaded");
        Ok(Scheduler {
            doctors,
            triage,
            storage,
        })
    }

    /// Register a doctor and append them to the doctor log.
    pub fn add_doctor(
        &mut self,
        doctor_id: &str,
        name: &str,
        specialty: &str,
    ) -> Result<(), ScheduleError> {
        if self.doctors.contains_key(doctor_id) {
            return Err(ScheduleError::DuplicateDoctor(doctor_id.to_string()));
        }
        let doctor = Doctor::new(doctor_id, name, specialty);
        self.storage.append_doctor(&doctor)?;
        self.doctors.insert(doctor_id.to_string(), doctor);
        info!(doctor_id, "doctor added");
        Ok(())
    }

    pub fn doctors(&self) -> impl Iterator<Item = &Doctor> {
        self.doctors.values()
    }

    pub fn doctor(&self, doctor_id: &str) -> Result<&Doctor, ScheduleError> {
        self.doctors
            .get(doctor_id)
            .ok_or_else(|| ScheduleError::DoctorNotFound(doctor_id.to_string()))
    }

    /// View one slot's booked appointments and waiting list.
    pub fn slot(&self, doctor_id: &str, time_slot: &str) -> Result<&Slot, ScheduleError> {
        self.doctor(doctor_id)?
            .slot(time_slot)
            .ok_or_else(|| ScheduleError::SlotNotFound(time_slot.to_string()))
    }

    /// Book a patient into a doctor's slot, or route them to the waiting
    /// list when the slot is full.
    ///
    /// Only a booked appointment gets a triage entry; waiting patients
    /// become eligible to be called when a cancellation promotes them.
    pub fn schedule_appointment(
        &mut self,
        patient: &Patient,
        doctor_id: &str,
        time_slot: &str,
    ) -> Result<ScheduleOutcome, ScheduleError> {
        let doctor = self
            .doctors
            .get_mut(doctor_id)
            .ok_or_else(|| ScheduleError::DoctorNotFound(doctor_id.to_string()))?;

        let slot = doctor.slot_or_create(time_slot);
        let appointment = Appointment::new(doctor_id, patient, time_slot);

        let outcome = if slot.book_if_room(appointment.clone()) {
            self.triage.push(&appointment);
            info!(doctor_id, time_slot, patient_id = %patient.patient_id, "appointment scheduled");
            ScheduleOutcome::Booked
        } else if slot.enqueue_waiting(patient.clone()) {
            info!(doctor_id, time_slot, patient_id = %patient.patient_id, "slot full, waitlisted");
            ScheduleOutcome::Waitlisted
        } else {
            warn!(doctor_id, time_slot, patient_id = %patient.patient_id, "waiting list full, patient dropped");
            ScheduleOutcome::WaitlistFull
        };

        self.persist()?;
        Ok(outcome)
    }

    /// Cancel a booked appointment.
    ///
    /// Frees one unit of capacity; if the slot has a waiting list, its FIFO
    /// head is promoted into a fresh booking with a new triage order and
    /// returned so the caller can report who moved. The stale triage entry
    /// for the cancelled appointment is left behind for `call_next` to skip.
    pub fn cancel_appointment(
        &mut self,
        doctor_id: &str,
        time_slot: &str,
        patient_id: &str,
    ) -> Result<Option<Patient>, ScheduleError> {
        let doctor = self
            .doctors
            .get_mut(doctor_id)
            .ok_or_else(|| ScheduleError::DoctorNotFound(doctor_id.to_string()))?;
        let slot = doctor
            .slot_mut(time_slot)
            .ok_or_else(|| ScheduleError::SlotNotFound(time_slot.to_string()))?;

        if !slot.remove_by_patient_id(patient_id) {
            return Err(ScheduleError::AppointmentNotFound(patient_id.to_string()));
        }
        info!(doctor_id, time_slot, patient_id, "appointment cancelled");

        let promoted = match slot.promote_head() {
            Some(patient) => {
                let appointment = Appointment::new(doctor_id, &patient, time_slot);
                let booked = slot.book_if_room(appointment.clone());
                debug_assert!(booked, "capacity was just freed by the cancellation");
                self.triage.push(&appointment);
                info!(doctor_id, time_slot, patient_id = %patient.patient_id, "promoted from waiting list");
                Some(patient)
            }
            None => None,
        };

        self.persist()?;
        Ok(promoted)
    }

    /// Serve the most urgent live appointment for one doctor.
    ///
    /// Runs the triage pop/validate/restore protocol: entries for other
    /// doctors are restored untouched, stale entries are discarded, and the
    /// first entry still backed by a booked appointment wins. `Ok(None)`
    /// means no eligible patient; the queue's remaining contents are
    /// unchanged in that case.
    pub fn call_next(&mut self, doctor_id: &str) -> Result<Option<Appointment>, ScheduleError> {
        if !self.doctors.contains_key(doctor_id) {
            return Err(ScheduleError::DoctorNotFound(doctor_id.to_string()));
        }

        let doctors = &self.doctors;
        let entry = self.triage.call_next(doctor_id, |e| {
            doctors
                .get(&e.doctor_id)
                .and_then(|d| d.slot(&e.time_slot))
                .map(|s| s.has_booking_for(&e.patient_id))
                .unwrap_or(false)
        });

        let Some(entry) = entry else {
            return Ok(None);
        };

        // Validation guarantees the doctor, slot and appointment still exist.
        let served = self
            .doctors
            .get_mut(&entry.doctor_id)
            .and_then(|d| d.slot_mut(&entry.time_slot))
            .and_then(|s| s.take_by_patient_id(&entry.patient_id))
            .ok_or_else(|| ScheduleError::AppointmentNotFound(entry.patient_id.clone()))?;

        info!(doctor_id, patient_id = %served.patient_id, time_slot = %served.time_slot, "patient called");
        self.persist()?;
        Ok(Some(served))
    }

    /// Every booked appointment in the system, in doctor / slot / insertion
    /// order.
    pub fn booked_appointments(&self) -> impl Iterator<Item = &Appointment> {
        self.doctors
            .values()
            .flat_map(|d| d.schedule().values())
            .flat_map(|s| s.appointments().iter())
    }

    /// Pending triage entries (live and stale) awaiting call-next.
    pub fn pending_count(&self) -> usize {
        self.triage.len()
    }

    fn persist(&self) -> Result<(), ScheduleError> {
        self.storage.rewrite_appointments(self.booked_appointments())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::{tempdir, TempDir};

    fn patient(id: &str, priority: u32) -> Patient {
        Patient::new(id, format!("Patient-{id}"), priority).unwrap()
    }

    fn scheduler_with_doctor() -> (Scheduler, TempDir) {
        let dir = tempdir().unwrap();
        let mut scheduler = Scheduler::load(Storage::new(dir.path())).unwrap();
        scheduler.add_doctor("D1", "House", "Diagnostics").unwrap();
        (scheduler, dir)
    }

    #[test]
    fn booked_appointment_is_visible_and_indexed() {
        let (mut scheduler, _dir) = scheduler_with_doctor();
        let outcome = scheduler
            .schedule_appointment(&patient("P1", 2), "D1", "09:00")
            .unwrap();
        assert_eq!(outcome, ScheduleOutcome::Booked);

        let slot = scheduler.slot("D1", "09:00").unwrap();
        assert_eq!(slot.appointments().len(), 1);
        assert_eq!(slot.capacity(), 2);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn unknown_doctor_aborts_without_creating_state() {
        let (mut scheduler, dir) = scheduler_with_doctor();
        let result = scheduler.schedule_appointment(&patient("P1", 2), "NOPE", "09:00");
        assert_matches!(result, Err(ScheduleError::DoctorNotFound(_)));
        assert_eq!(scheduler.pending_count(), 0);
        // No snapshot was written for the failed request.
        assert!(!dir.path().join("appointments.txt").exists());
    }

    #[test]
    fn duplicate_doctor_is_rejected() {
        let (mut scheduler, _dir) = scheduler_with_doctor();
        assert_matches!(
            scheduler.add_doctor("D1", "Other", "Cardiology"),
            Err(ScheduleError::DuplicateDoctor(_))
        );
    }

    #[test]
    fn full_slot_routes_to_waiting_list_then_drops() {
        let (mut scheduler, _dir) = scheduler_with_doctor();
        // Default capacity is 2 for both the slot and its waiting list.
        for (id, expected) in [
            ("P1", ScheduleOutcome::Booked),
            ("P2", ScheduleOutcome::Booked),
            ("P3", ScheduleOutcome::Waitlisted),
            ("P4", ScheduleOutcome::Waitlisted),
            ("P5", ScheduleOutcome::WaitlistFull),
        ] {
            let outcome = scheduler
                .schedule_appointment(&patient(id, 1), "D1", "09:00")
                .unwrap();
            assert_eq!(outcome, expected, "{id}");
        }

        let slot = scheduler.slot("D1", "09:00").unwrap();
        assert_eq!(slot.appointments().len(), 2);
        assert_eq!(slot.waiting().len(), 2);
        // Waiting patients are not eligible to be called.
        assert_eq!(scheduler.pending_count(), 2);
    }

    #[test]
    fn cancel_promotes_the_waiting_head_and_keeps_the_count() {
        let (mut scheduler, _dir) = scheduler_with_doctor();
        for id in ["P1", "P2", "P3"] {
            scheduler
                .schedule_appointment(&patient(id, 1), "D1", "09:00")
                .unwrap();
        }

        let promoted = scheduler.cancel_appointment("D1", "09:00", "P1").unwrap();
        assert_eq!(promoted.unwrap().patient_id, "P3");

        let slot = scheduler.slot("D1", "09:00").unwrap();
        assert_eq!(slot.appointments().len(), 2);
        assert!(slot.waiting().is_empty());
        assert!(slot.has_booking_for("P3"));
        assert!(!slot.has_booking_for("P1"));
    }

    #[test]
    fn cancel_not_found_variants() {
        let (mut scheduler, _dir) = scheduler_with_doctor();
        scheduler
            .schedule_appointment(&patient("P1", 1), "D1", "09:00")
            .unwrap();

        assert_matches!(
            scheduler.cancel_appointment("NOPE", "09:00", "P1"),
            Err(ScheduleError::DoctorNotFound(_))
        );
        assert_matches!(
            scheduler.cancel_appointment("D1", "10:00", "P1"),
            Err(ScheduleError::SlotNotFound(_))
        );
        assert_matches!(
            scheduler.cancel_appointment("D1", "09:00", "P9"),
            Err(ScheduleError::AppointmentNotFound(_))
        );
    }

    #[test]
    fn call_next_serves_by_priority_then_booking_order() {
        let (mut scheduler, _dir) = scheduler_with_doctor();
        scheduler
            .schedule_appointment(&patient("A", 2), "D1", "09:00")
            .unwrap();
        scheduler
            .schedule_appointment(&patient("B", 1), "D1", "09:00")
            .unwrap();
        scheduler
            .schedule_appointment(&patient("C", 1), "D1", "10:00")
            .unwrap();

        let first = scheduler.call_next("D1").unwrap().unwrap();
        assert_eq!(first.patient_id, "B");
        let second = scheduler.call_next("D1").unwrap().unwrap();
        assert_eq!(second.patient_id, "C");
        let third = scheduler.call_next("D1").unwrap().unwrap();
        assert_eq!(third.patient_id, "A");
        assert!(scheduler.call_next("D1").unwrap().is_none());
    }

    #[test]
    fn call_next_never_serves_a_cancelled_appointment() {
        let (mut scheduler, _dir) = scheduler_with_doctor();
        scheduler
            .schedule_appointment(&patient("P1", 0), "D1", "09:00")
            .unwrap();
        scheduler
            .schedule_appointment(&patient("P2", 5), "D1", "09:00")
            .unwrap();
        scheduler.cancel_appointment("D1", "09:00", "P1").unwrap();

        // P1's triage entry is stale and must be skipped, not served.
        let served = scheduler.call_next("D1").unwrap().unwrap();
        assert_eq!(served.patient_id, "P2");
        assert!(scheduler.call_next("D1").unwrap().is_none());
    }

    #[test]
    fn call_next_for_another_doctor_leaves_the_queue_intact() {
        let (mut scheduler, _dir) = scheduler_with_doctor();
        scheduler.add_doctor("D2", "Grey", "Surgery").unwrap();
        scheduler
            .schedule_appointment(&patient("P1", 1), "D1", "09:00")
            .unwrap();

        assert!(scheduler.call_next("D2").unwrap().is_none());
        assert_eq!(scheduler.pending_count(), 1);
        // The D1 entry is still servable afterwards.
        let served = scheduler.call_next("D1").unwrap().unwrap();
        assert_eq!(served.patient_id, "P1");
    }

    #[test]
    fn call_next_requires_a_known_doctor() {
        let (mut scheduler, _dir) = scheduler_with_doctor();
        assert_matches!(
            scheduler.call_next("NOPE"),
            Err(ScheduleError::DoctorNotFound(_))
        );
    }

    #[test]
    fn promoted_patient_is_callable() {
        let (mut scheduler, _dir) = scheduler_with_doctor();
        // Capacity 2: P3 waits until a cancellation frees a seat.
        for id in ["P1", "P2", "P3"] {
            scheduler
                .schedule_appointment(&patient(id, 0), "D1", "09:00")
                .unwrap();
        }
        scheduler.cancel_appointment("D1", "09:00", "P2").unwrap();

        let order: Vec<String> = std::iter::from_fn(|| {
            scheduler
                .call_next("D1")
                .unwrap()
                .map(|a| a.patient_id.clone())
        })
        .collect();
        // P3 re-entered with a fresh order, behind P1.
        assert_eq!(order, ["P1", "P3"]);
    }
}

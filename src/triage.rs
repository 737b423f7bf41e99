//! Cross-doctor triage queue.
//!
//! A single priority queue spans every doctor's booked appointments. Entries
//! are derived pointers into slot state, not owning references: cancelling
//! or serving an appointment leaves its entry behind, and `call_next`
//! discards such stale entries lazily when it meets them. This avoids a
//! removal-by-key operation at cancellation time at the cost of an O(n)
//! scan per call in the worst case; an index from patient id to heap
//! position would allow true O(log n) removal if that ever matters.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::models::Appointment;

/// One pending "to be called" appointment in the triage queue.
///
/// `order` is stamped by the queue when the entry is pushed and gives a
/// strict FIFO tie-break among equal priority levels. It is never persisted;
/// after a restart orders are re-derived from snapshot file order.
#[derive(Debug, Clone)]
pub struct TriageEntry {
    pub priority_level: u32,
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub time_slot: String,
    order: u64,
}

impl PartialEq for TriageEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority_level == other.priority_level && self.order == other.order
    }
}

impl Eq for TriageEntry {}

impl PartialOrd for TriageEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TriageEntry {
    /// Inverted comparison so the max-heap pops the most urgent entry:
    /// lower priority level first, then lower insertion order.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority_level
            .cmp(&self.priority_level)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// Process-wide priority queue over all doctors' booked appointments.
#[derive(Debug, Default)]
pub struct TriageQueue {
    heap: BinaryHeap<TriageEntry>,
    next_order: u64,
}

impl TriageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Index a freshly booked appointment, stamping the next order value.
    pub fn push(&mut self, appointment: &Appointment) {
        let entry = TriageEntry {
            priority_level: appointment.priority_level,
            patient_id: appointment.patient_id.clone(),
            patient_name: appointment.patient_name.clone(),
            doctor_id: appointment.doctor_id.clone(),
            time_slot: appointment.time_slot.clone(),
            order: self.next_order,
        };
        self.next_order += 1;
        self.heap.push(entry);
    }

    /// Pop the most urgent live entry for one doctor.
    ///
    /// Entries for other doctors are buffered and restored afterwards with
    /// their order values untouched, so their relative ordering is
    /// unaffected. Entries for this doctor that fail the `is_live` probe are
    /// stale (already cancelled or already served) and are dropped for good.
    /// Returns `None` when the queue holds no live entry for the doctor.
    pub fn call_next<F>(&mut self, doctor_id: &str, mut is_live: F) -> Option<TriageEntry>
    where
        F: FnMut(&TriageEntry) -> bool,
    {
        let mut buffered = Vec::new();
        let mut matched = None;

        while let Some(entry) = self.heap.pop() {
            if entry.doctor_id != doctor_id {
                buffered.push(entry);
                continue;
            }
            if !is_live(&entry) {
                debug!(
                    patient_id = %entry.patient_id,
                    time_slot = %entry.time_slot,
                    "dropping stale triage entry"
                );
                continue;
            }
            matched = Some(entry);
            break;
        }

        for entry in buffered {
            self.heap.push(entry);
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Appointment, Patient};

    fn appointment(doctor: &str, patient: &str, priority: u32) -> Appointment {
        let p = Patient::new(patient, format!("Patient {patient}"), priority).unwrap();
        Appointment::new(doctor, &p, "09:00")
    }

    #[test]
    fn lower_priority_level_is_served_first() {
        let mut queue = TriageQueue::new();
        queue.push(&appointment("D1", "routine", 2));
        queue.push(&appointment("D1", "emergency", 0));
        queue.push(&appointment("D1", "urgent", 1));

        let first = queue.call_next("D1", |_| true).unwrap();
        assert_eq!(first.patient_id, "emergency");
        let second = queue.call_next("D1", |_| true).unwrap();
        assert_eq!(second.patient_id, "urgent");
    }

    #[test]
    fn equal_priorities_are_fifo() {
        let mut queue = TriageQueue::new();
        for id in ["first", "second", "third"] {
            queue.push(&appointment("D1", id, 1));
        }
        let order: Vec<_> = (0..3)
            .map(|_| queue.call_next("D1", |_| true).unwrap().patient_id)
            .collect();
        assert_eq!(order, ["first", "second", "third"]);
    }

    #[test]
    fn stale_entries_are_skipped_and_dropped() {
        let mut queue = TriageQueue::new();
        queue.push(&appointment("D1", "cancelled", 0));
        queue.push(&appointment("D1", "live", 5));

        let served = queue
            .call_next("D1", |e| e.patient_id != "cancelled")
            .unwrap();
        assert_eq!(served.patient_id, "live");
        // The stale entry was consumed, not restored.
        assert!(queue.is_empty());
    }

    #[test]
    fn other_doctors_entries_are_restored_unchanged() {
        let mut queue = TriageQueue::new();
        queue.push(&appointment("D1", "a", 1));
        queue.push(&appointment("D1", "b", 1));
        queue.push(&appointment("D2", "c", 0));

        assert!(queue.call_next("D3", |_| true).is_none());
        assert_eq!(queue.len(), 3);

        // Relative ordering survives the scan.
        assert_eq!(queue.call_next("D2", |_| true).unwrap().patient_id, "c");
        assert_eq!(queue.call_next("D1", |_| true).unwrap().patient_id, "a");
        assert_eq!(queue.call_next("D1", |_| true).unwrap().patient_id, "b");
    }

    #[test]
    fn exhausted_queue_reports_none() {
        let mut queue = TriageQueue::new();
        assert!(queue.call_next("D1", |_| true).is_none());
        queue.push(&appointment("D1", "gone", 1));
        assert!(queue.call_next("D1", |_| false).is_none());
        assert!(queue.is_empty());
    }
}

//! Priority-based hospital appointment booking and triage.
//!
//! Patients are booked into capacity-bounded doctor time slots; overflow
//! goes to a per-slot FIFO waiting list, and booked patients are served back
//! out through a cross-doctor triage queue ordered by clinical priority with
//! FIFO tie-breaking. In-memory state is mirrored to an on-disk doctor log
//! and appointment snapshot after every mutation.

pub mod error;
pub mod models;
pub mod scheduler;
pub mod slot;
pub mod storage;
pub mod triage;

pub use error::ScheduleError;
pub use models::{validate_time_label, Appointment, Doctor, Patient, DEFAULT_SLOT_CAPACITY};
pub use scheduler::{ScheduleOutcome, Scheduler};
pub use slot::Slot;
pub use storage::Storage;
pub use triage::{TriageEntry, TriageQueue};

//! Error taxonomy for the scheduling core.
//!
//! Not-found conditions abort the operation with zero state mutation.
//! A full slot is not an error (it routes to the waiting list), and a full
//! waiting list is a reported outcome, so neither appears here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("doctor not found: {0}")]
    DoctorNotFound(String),

    #[error("time slot not found: {0}")]
    SlotNotFound(String),

    #[error("no appointment for patient {0} in this slot")]
    AppointmentNotFound(String),

    #[error("doctor already exists: {0}")]
    DuplicateDoctor(String),

    #[error("invalid time slot label '{0}': expected HH:MM")]
    InvalidTimeSlot(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
}

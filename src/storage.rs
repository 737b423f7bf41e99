//! Line-oriented persistence for doctors and appointments.
//!
//! Two text artifacts with a fixed whitespace-separated layout:
//! - `doctors.txt`: append-only log, one `doctorID name specialty` per line.
//! - `appointments.txt`: snapshot of every currently booked appointment,
//!   `doctorID timeSlot patientID patientName priorityLevel` per line, fully
//!   rewritten after each mutation.
//!
//! Waiting lists and triage ordering are not persisted. Fields containing
//! whitespace do not survive a round trip; that is an accepted limitation of
//! the format.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ScheduleError;
use crate::models::{Appointment, Doctor};

const DOCTORS_FILE: &str = "doctors.txt";
const APPOINTMENTS_FILE: &str = "appointments.txt";

/// A doctor line read back from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorRecord {
    pub doctor_id: String,
    pub name: String,
    pub specialty: String,
}

pub struct Storage {
    doctors_path: PathBuf,
    appointments_path: PathBuf,
}

impl Storage {
    /// Storage rooted at a data directory; file names are fixed.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Storage {
            doctors_path: dir.join(DOCTORS_FILE),
            appointments_path: dir.join(APPOINTMENTS_FILE),
        }
    }

    /// Append one doctor line to the log.
    pub fn append_doctor(&self, doctor: &Doctor) -> Result<(), ScheduleError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.doctors_path)?;
        writeln!(
            file,
            "{} {} {}",
            doctor.doctor_id, doctor.name, doctor.specialty
        )?;
        Ok(())
    }

    /// Read the doctor log; a missing file is an empty system, not an error.
    pub fn load_doctors(&self) -> Result<Vec<DoctorRecord>, ScheduleError> {
        let file = match File::open(&self.doctors_path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let &[doctor_id, name, specialty] = fields.as_slice() else {
                return Err(ScheduleError::MalformedRecord {
                    line: index + 1,
                    reason: format!("expected 3 fields, got {}", fields.len()),
                });
            };
            records.push(DoctorRecord {
                doctor_id: doctor_id.to_string(),
                name: name.to_string(),
                specialty: specialty.to_string(),
            });
        }
        Ok(records)
    }

    /// Overwrite the snapshot with the full booked-appointment set.
    ///
    /// Idempotent full rewrite; callers pass every booked appointment in the
    /// system, in a stable doctor/slot/insertion order.
    pub fn rewrite_appointments<'a, I>(&self, appointments: I) -> Result<(), ScheduleError>
    where
        I: IntoIterator<Item = &'a Appointment>,
    {
        let mut writer = BufWriter::new(File::create(&self.appointments_path)?);
        for a in appointments {
            writeln!(
                writer,
                "{} {} {} {} {}",
                a.doctor_id, a.time_slot, a.patient_id, a.patient_name, a.priority_level
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read the appointment snapshot in file order.
    pub fn load_appointments(&self) -> Result<Vec<Appointment>, ScheduleError> {
        let file = match File::open(&self.appointments_path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let &[doctor_id, time_slot, patient_id, patient_name, priority] = fields.as_slice() else {
                return Err(ScheduleError::MalformedRecord {
                    line: index + 1,
                    reason: format!("expected 5 fields, got {}", fields.len()),
                });
            };
            let priority_level =
                priority
                    .parse::<u32>()
                    .map_err(|e| ScheduleError::MalformedRecord {
                        line: index + 1,
                        reason: format!("bad priority level '{priority}': {e}"),
                    })?;
            records.push(Appointment {
                doctor_id: doctor_id.to_string(),
                time_slot: time_slot.to_string(),
                patient_id: patient_id.to_string(),
                patient_name: patient_name.to_string(),
                priority_level,
            });
        }
        info!(count = records.len(), "loaded appointment snapshot");
        Ok(records)
    }
}

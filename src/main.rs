//! Interactive menu for the clinic scheduling system.
//!
//! Thin shell over the library: it validates raw input (priority, HH:MM
//! labels) before anything reaches the core, then formats the outcomes.

use std::io::{self, Write};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use clinicflow::{validate_time_label, Patient, ScheduleOutcome, Scheduler, Slot, Storage};

struct ClinicCli {
    scheduler: Scheduler,
    running: bool,
}

impl ClinicCli {
    fn new(scheduler: Scheduler) -> Self {
        ClinicCli {
            scheduler,
            running: true,
        }
    }

    fn print_menu(&self) {
        println!("\n===== Clinic Scheduling =====");
        println!("1. Add doctor");
        println!("2. List doctors");
        println!("3. View doctor schedule");
        println!("4. Schedule appointment");
        println!("5. Cancel appointment");
        println!("6. Call next patient");
        println!("7. List appointments for doctor & time slot");
        println!("0. Exit");
        println!("{}", "-".repeat(29));
    }

    fn get_input(&self, prompt: &str) -> String {
        loop {
            print!("{}: ", prompt);
            let _ = io::stdout().flush();

            let mut input = String::new();
            if io::stdin().read_line(&mut input).is_err() {
                return String::new();
            }
            let input = input.trim();
            if !input.is_empty() {
                return input.to_string();
            }
            println!("Input cannot be empty");
        }
    }

    fn get_priority(&self) -> u32 {
        loop {
            let input = self.get_input("Priority level (0 = most urgent)");
            match input.parse::<u32>() {
                Ok(value) => return value,
                Err(_) => println!("Priority must be a non-negative number"),
            }
        }
    }

    fn get_time_slot(&self) -> String {
        loop {
            let input = self.get_input("Time slot (HH:MM)");
            match validate_time_label(&input) {
                Ok(()) => return input,
                Err(e) => println!("{e}"),
            }
        }
    }

    fn add_doctor(&mut self) {
        println!("\n--- Add Doctor ---");
        let id = self.get_input("Doctor ID");
        let name = self.get_input("Name");
        let specialty = self.get_input("Specialty");

        match self.scheduler.add_doctor(&id, &name, &specialty) {
            Ok(()) => println!("Doctor added successfully."),
            Err(e) => println!("{e}"),
        }
    }

    fn list_doctors(&self) {
        let mut any = false;
        for doctor in self.scheduler.doctors() {
            any = true;
            println!(
                "{} | {} | {} | Appointments: {}",
                doctor.doctor_id,
                doctor.name,
                doctor.specialty,
                doctor.booked_count()
            );
        }
        if !any {
            println!("No doctors in the system.");
        }
    }

    fn view_schedule(&self) {
        let id = self.get_input("Doctor ID");
        let doctor = match self.scheduler.doctor(&id) {
            Ok(d) => d,
            Err(e) => {
                println!("{e}");
                return;
            }
        };

        if doctor.schedule().is_empty() {
            println!("No schedule available for this doctor.");
            return;
        }
        for (label, slot) in doctor.schedule() {
            println!(
                "\n{} (capacity {}, booked {})",
                label,
                slot.capacity(),
                slot.appointments().len()
            );
            print_slot(slot);
        }
    }

    fn schedule_appointment(&mut self) {
        println!("\n--- Schedule Appointment ---");
        let patient_id = self.get_input("Patient ID");
        let name = self.get_input("Patient name");
        let priority = self.get_priority();
        let doctor_id = self.get_input("Doctor ID");
        let time_slot = self.get_time_slot();

        let patient = match Patient::new(patient_id, name, priority) {
            Ok(p) => p,
            Err(e) => {
                println!("{e}");
                return;
            }
        };

        match self
            .scheduler
            .schedule_appointment(&patient, &doctor_id, &time_slot)
        {
            Ok(ScheduleOutcome::Booked) => println!("Appointment scheduled."),
            Ok(ScheduleOutcome::Waitlisted) => println!("Slot full. Added to waiting list."),
            Ok(ScheduleOutcome::WaitlistFull) => {
                println!("Waiting list is full. We can't add!")
            }
            Err(e) => println!("{e}"),
        }
    }

    fn cancel_appointment(&mut self) {
        println!("\n--- Cancel Appointment ---");
        let doctor_id = self.get_input("Doctor ID");
        let time_slot = self.get_input("Time slot");
        let patient_id = self.get_input("Patient ID");

        match self
            .scheduler
            .cancel_appointment(&doctor_id, &time_slot, &patient_id)
        {
            Ok(promoted) => {
                println!("Appointment cancelled.");
                if let Some(patient) = promoted {
                    println!("{} moved from waiting list.", patient.name);
                }
            }
            Err(e) => println!("{e}"),
        }
    }

    fn call_next(&mut self) {
        let doctor_id = self.get_input("Doctor ID");
        match self.scheduler.call_next(&doctor_id) {
            Ok(Some(appointment)) => {
                println!("\n=== NEXT PATIENT ===");
                println!("Patient ID : {}", appointment.patient_id);
                println!("Name       : {}", appointment.patient_name);
                println!("Priority   : {}", appointment.priority_level);
                println!("Doctor     : {}", appointment.doctor_id);
                println!("Time Slot  : {}", appointment.time_slot);
                println!("\nPatient has been called.");
            }
            Ok(None) => println!("No eligible patient for this doctor."),
            Err(e) => println!("{e}"),
        }
    }

    fn list_appointments(&self) {
        let doctor_id = self.get_input("Doctor ID");
        let time_slot = self.get_input("Time slot");

        let slot = match self.scheduler.slot(&doctor_id, &time_slot) {
            Ok(s) => s,
            Err(e) => {
                println!("{e}");
                return;
            }
        };

        println!("\n=== APPOINTMENTS ===");
        println!("Doctor   : {}", doctor_id);
        println!("TimeSlot : {}", time_slot);
        println!("Capacity : {}", slot.capacity());
        println!("Booked   : {}\n", slot.appointments().len());
        print_slot(slot);
    }

    fn run(&mut self) {
        while self.running {
            self.print_menu();
            let choice = self.get_input("Choice");

            match choice.as_str() {
                "1" => self.add_doctor(),
                "2" => self.list_doctors(),
                "3" => self.view_schedule(),
                "4" => self.schedule_appointment(),
                "5" => self.cancel_appointment(),
                "6" => self.call_next(),
                "7" => self.list_appointments(),
                "0" => {
                    println!("Exiting system...");
                    self.running = false;
                }
                _ => println!("Invalid choice."),
            }
        }
    }
}

fn print_slot(slot: &Slot) {
    if slot.appointments().is_empty() {
        println!("No appointments.");
    } else {
        for a in slot.appointments() {
            println!(
                "- {} | {} | priority {}",
                a.patient_id, a.patient_name, a.priority_level
            );
        }
    }

    println!("--- Waiting List ---");
    if slot.waiting().is_empty() {
        println!("No patients waiting.");
    } else {
        for p in slot.waiting() {
            println!("- {} | {} | priority {}", p.patient_id, p.name, p.priority_level);
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let data_dir = std::env::var("CLINICFLOW_DATA_DIR").unwrap_or_else(|_| ".".to_string());
    let storage = Storage::new(&data_dir);
    let scheduler =
        Scheduler::load(storage).with_context(|| format!("loading state from {data_dir}"))?;

    ClinicCli::new(scheduler).run();
    Ok(())
}

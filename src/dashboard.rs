use std::collections::HashSet;

use chrono::NaiveDate;

use crate::models::{Appointment, AppointmentStatus, DashboardStats, Patient};

/// Dashboard counters for `today`. `total_patients` counts distinct patients
/// with an appointment that day; `new_patients` counts patient records
/// created that day. Revenue is not tracked locally and stays 0.
pub fn compute_stats(
    appointments: &[Appointment],
    patients: &[Patient],
    today: NaiveDate,
) -> DashboardStats {
    let todays: Vec<&Appointment> = appointments.iter().filter(|a| a.date == today).collect();

    let count = |pred: fn(&Appointment) -> bool| todays.iter().filter(|a| pred(a)).count() as u32;
    let distinct: HashSet<&str> = todays.iter().map(|a| a.patient_id.as_str()).collect();

    DashboardStats {
        total_patients: distinct.len() as u32,
        today_appointments: todays.len() as u32,
        completed_appointments: count(|a| a.status == AppointmentStatus::Completed),
        pending_appointments: count(|a| a.status.is_pending()),
        cancelled_appointments: count(|a| a.status == AppointmentStatus::Cancelled),
        revenue: 0.0,
        new_patients: patients
            .iter()
            .filter(|p| p.created_at.date_naive() == today)
            .count() as u32,
    }
}

/// Greeting for the local hour of day (0-23).
pub fn greeting(hour: u32) -> &'static str {
    match hour {
        0..=11 => "Good morning",
        12..=16 => "Good afternoon",
        _ => "Good evening",
    }
}

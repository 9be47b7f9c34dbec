//! Per-role read models over the stores, plus the actions each role can take.
//!
//! Views borrow the stores and hold no state of their own. Actions take the
//! appointment store mutably and return the message shown to the user.

pub mod doctor;
pub mod patient;
pub mod receptionist;

use std::fmt;

use chrono::{Local, NaiveDate};

use crate::types::{Appointment, AppointmentStatus, Profile, User};

pub use doctor::DoctorDashboard;
pub use patient::{BookingForm, PatientDashboard};
pub use receptionist::{AppointmentFilter, DoctorLoad, ReceptionistDashboard};

/// Bookable half-hour slots
pub const TIME_SLOTS: [&str; 17] = [
    "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "12:00", "12:30", "13:00", "13:30",
    "14:00", "14:30", "15:00", "15:30", "16:00", "16:30", "17:00",
];

/// Front desk grid, an hour wider on each side
pub const RECEPTION_TIME_SLOTS: [&str; 21] = [
    "08:00", "08:30", "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "12:00", "12:30",
    "13:00", "13:30", "14:00", "14:30", "15:00", "15:30", "16:00", "16:30", "17:00", "17:30",
    "18:00",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    Patient,
    Doctor,
    Receptionist,
}

impl Dashboard {
    pub fn for_user(user: &User) -> Self {
        match &user.profile {
            Profile::Patient(_) => Dashboard::Patient,
            Profile::Doctor(_) => Dashboard::Doctor,
            Profile::Receptionist(_) => Dashboard::Receptionist,
        }
    }
}

/// Outcome text for a dashboard action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionMessage {
    MissingFields,
    RequestSubmitted,
    Created,
    StatusUpdated(AppointmentStatus),
    UpdateFailed,
    Cancelled,
    CancelFailed,
}

impl fmt::Display for ActionMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionMessage::MissingFields => f.write_str("Please fill in all required fields."),
            ActionMessage::RequestSubmitted => {
                f.write_str("Appointment request submitted successfully!")
            }
            ActionMessage::Created => f.write_str("Appointment created successfully!"),
            ActionMessage::StatusUpdated(status) => {
                write!(f, "Appointment {} successfully!", status)
            }
            ActionMessage::UpdateFailed => {
                f.write_str("Failed to update appointment. Please try again.")
            }
            ActionMessage::Cancelled => f.write_str("Appointment cancelled successfully."),
            ActionMessage::CancelFailed => {
                f.write_str("Failed to cancel appointment. Please try again.")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    pub fn tally<'a>(appointments: impl IntoIterator<Item = &'a Appointment>) -> Self {
        let mut counts = Self::default();
        for appt in appointments {
            match appt.status {
                AppointmentStatus::Pending => counts.pending += 1,
                AppointmentStatus::Confirmed => counts.confirmed += 1,
                AppointmentStatus::Completed => counts.completed += 1,
                AppointmentStatus::Cancelled => counts.cancelled += 1,
            }
        }
        counts
    }

    pub fn get(&self, status: AppointmentStatus) -> usize {
        match status {
            AppointmentStatus::Pending => self.pending,
            AppointmentStatus::Confirmed => self.confirmed,
            AppointmentStatus::Completed => self.completed,
            AppointmentStatus::Cancelled => self.cancelled,
        }
    }
}

/// `"First Last"` for a known user id, `"Unknown"` otherwise.
pub fn display_name(directory: &[User], user_id: &str) -> String {
    lookup(directory, user_id)
        .map(User::full_name)
        .unwrap_or_else(|| "Unknown".to_string())
}

pub fn lookup<'a>(directory: &'a [User], user_id: &str) -> Option<&'a User> {
    directory.iter().find(|user| user.id == user_id)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn newest_first(mut appointments: Vec<&Appointment>) -> Vec<&Appointment> {
    // ISO dates order lexicographically
    appointments.sort_by(|a, b| b.date.cmp(&a.date));
    appointments
}

fn by_time(mut appointments: Vec<&Appointment>) -> Vec<&Appointment> {
    appointments.sort_by(|a, b| a.time.cmp(&b.time));
    appointments
}

fn on_date<'a>(
    appointments: impl IntoIterator<Item = &'a Appointment>,
    date: NaiveDate,
) -> Vec<&'a Appointment> {
    let date = iso_date(date);
    appointments
        .into_iter()
        .filter(|appt| appt.date == date)
        .collect()
}

fn status_message(updated: bool, status: AppointmentStatus) -> ActionMessage {
    if updated {
        ActionMessage::StatusUpdated(status)
    } else {
        ActionMessage::UpdateFailed
    }
}

fn cancel_message(cancelled: bool) -> ActionMessage {
    if cancelled {
        ActionMessage::Cancelled
    } else {
        ActionMessage::CancelFailed
    }
}

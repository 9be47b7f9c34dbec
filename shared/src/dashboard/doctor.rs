use chrono::NaiveDate;

use crate::appointments::AppointmentStore;
use crate::fixtures::FixtureSource;
use crate::types::{Appointment, AppointmentStatus, User};

use super::{by_time, display_name, lookup, newest_first, on_date, status_message, ActionMessage, StatusCounts};

pub struct DoctorDashboard<'a> {
    doctor: &'a User,
    appointments: &'a [Appointment],
    directory: &'a [User],
}

impl<'a> DoctorDashboard<'a> {
    pub fn new<F: FixtureSource>(doctor: &'a User, store: &'a AppointmentStore<F>) -> Self {
        Self {
            doctor,
            appointments: store.appointments(),
            directory: store.directory(),
        }
    }

    pub fn doctor(&self) -> &'a User {
        self.doctor
    }

    fn own(&self) -> impl Iterator<Item = &'a Appointment> {
        let doctor: &'a User = self.doctor;
        self.appointments
            .iter()
            .filter(move |appt| appt.doctor_id == doctor.id)
    }

    /// All of this doctor's appointments, latest date first
    pub fn history(&self) -> Vec<&'a Appointment> {
        newest_first(self.own().collect())
    }

    /// Schedule for one day, ordered by time
    pub fn schedule(&self, date: NaiveDate) -> Vec<&'a Appointment> {
        by_time(on_date(self.own(), date))
    }

    pub fn today(&self) -> Vec<&'a Appointment> {
        self.schedule(super::today())
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::tally(self.own())
    }

    pub fn patient_name(&self, patient_id: &str) -> String {
        display_name(self.directory, patient_id)
    }

    pub fn patient_phone(&self, patient_id: &str) -> &'a str {
        lookup(self.directory, patient_id)
            .map(|user| user.phone.as_str())
            .unwrap_or("N/A")
    }
}

/// Approve, decline, or complete an appointment, optionally with notes.
pub fn set_status<F: FixtureSource>(
    store: &mut AppointmentStore<F>,
    appointment_id: &str,
    status: AppointmentStatus,
    notes: Option<&str>,
) -> ActionMessage {
    status_message(
        store.update_appointment_status(appointment_id, status, notes),
        status,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::test_support::{loaded_store, user};

    #[tokio::test]
    async fn test_schedule_is_per_doctor_and_time_ordered() {
        let mut store = loaded_store().await;
        store.create_appointment(crate::types::AppointmentRequest {
            patient_id: "p1".to_string(),
            doctor_id: "d1".to_string(),
            date: "2025-01-06".to_string(),
            time: "08:30".to_string(),
            reason: "Early slot".to_string(),
        });

        let doctor = user(&store, "d1");
        let view = DoctorDashboard::new(&doctor, &store);
        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

        let times: Vec<&str> = view.schedule(day).iter().map(|a| a.time.as_str()).collect();
        assert_eq!(times, vec!["08:30", "09:30", "11:00"]);
        assert!(view.schedule(day.succ_opt().unwrap()).is_empty());

        let counts = view.counts();
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.confirmed, 1);
        assert_eq!(view.history().len(), 3);
    }

    #[tokio::test]
    async fn test_patient_details_resolve_or_fall_back() {
        let store = loaded_store().await;
        let doctor = user(&store, "d1");
        let view = DoctorDashboard::new(&doctor, &store);

        assert_eq!(view.patient_name("p2"), "Liam Chen");
        assert_eq!(view.patient_phone("p2"), "+1-555-0102");
        assert_eq!(view.patient_name("gone"), "Unknown");
        assert_eq!(view.patient_phone("gone"), "N/A");
    }

    #[tokio::test]
    async fn test_complete_with_notes() {
        let mut store = loaded_store().await;
        let message = set_status(&mut store, "a1", AppointmentStatus::Completed, Some("BP stable"));

        assert_eq!(message.to_string(), "Appointment completed successfully!");
        let appt = store.find("a1").unwrap();
        assert_eq!(appt.status, AppointmentStatus::Completed);
        assert_eq!(appt.notes.as_deref(), Some("BP stable"));
    }
}

use crate::appointments::AppointmentStore;
use crate::fixtures::FixtureSource;
use crate::types::{Appointment, AppointmentRequest, User};

use super::{
    cancel_message, display_name, newest_first, ActionMessage, StatusCounts, TIME_SLOTS,
};

pub struct PatientDashboard<'a> {
    patient: &'a User,
    appointments: &'a [Appointment],
    doctors: &'a [User],
    directory: &'a [User],
}

impl<'a> PatientDashboard<'a> {
    pub fn new<F: FixtureSource>(patient: &'a User, store: &'a AppointmentStore<F>) -> Self {
        Self {
            patient,
            appointments: store.appointments(),
            doctors: store.doctors(),
            directory: store.directory(),
        }
    }

    pub fn patient(&self) -> &'a User {
        self.patient
    }

    /// The patient's own appointments, latest date first
    pub fn appointments(&self) -> Vec<&'a Appointment> {
        newest_first(
            self.appointments
                .iter()
                .filter(|appt| appt.patient_id == self.patient.id)
                .collect(),
        )
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::tally(self.appointments())
    }

    /// Distinct specialties in roster order
    pub fn specialties(&self) -> Vec<&'a str> {
        let mut specialties: Vec<&str> = Vec::new();
        for doctor in self.doctors.iter().filter_map(User::as_doctor) {
            if !specialties.contains(&doctor.specialty.as_str()) {
                specialties.push(&doctor.specialty);
            }
        }
        specialties
    }

    /// Doctors offering `specialty`, or the whole roster when none is chosen.
    pub fn doctors_for(&self, specialty: Option<&str>) -> Vec<&'a User> {
        self.doctors
            .iter()
            .filter(|doctor| match specialty {
                Some(wanted) => doctor
                    .as_doctor()
                    .is_some_and(|profile| profile.specialty == wanted),
                None => true,
            })
            .collect()
    }

    pub fn name_of(&self, user_id: &str) -> String {
        display_name(self.directory, user_id)
    }

    pub fn time_slots(&self) -> &'static [&'static str] {
        &TIME_SLOTS
    }
}

/// Booking form as filled in by a patient
#[derive(Debug, Clone, Default)]
pub struct BookingForm {
    pub doctor_id: String,
    pub date: String,
    pub time: String,
    pub reason: String,
}

impl BookingForm {
    /// Only empty fields count as missing; whitespace is accepted.
    fn is_complete(&self) -> bool {
        [&self.doctor_id, &self.date, &self.time, &self.reason]
            .iter()
            .all(|field| !field.is_empty())
    }
}

pub fn request_appointment<F: FixtureSource>(
    store: &mut AppointmentStore<F>,
    patient: &User,
    form: BookingForm,
) -> ActionMessage {
    if !form.is_complete() {
        return ActionMessage::MissingFields;
    }

    store.create_appointment(AppointmentRequest {
        patient_id: patient.id.clone(),
        doctor_id: form.doctor_id,
        date: form.date,
        time: form.time,
        reason: form.reason,
    });
    ActionMessage::RequestSubmitted
}

pub fn cancel<F: FixtureSource>(store: &mut AppointmentStore<F>, appointment_id: &str) -> ActionMessage {
    cancel_message(store.cancel_appointment(appointment_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::test_support::{loaded_store, user};
    use crate::types::AppointmentStatus;

    #[tokio::test]
    async fn test_patient_sees_only_own_appointments_newest_first() {
        let store = loaded_store().await;
        let patient = user(&store, "p1");
        let view = PatientDashboard::new(&patient, &store);

        let ids: Vec<&str> = view.appointments().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);

        let counts = view.counts();
        assert_eq!(counts.confirmed, 1);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.pending, 0);
        assert_eq!(view.name_of("d2"), "Michael Brown");
        assert_eq!(view.time_slots().last(), Some(&"17:00"));
    }

    #[tokio::test]
    async fn test_specialties_and_doctor_filter() {
        let store = loaded_store().await;
        let patient = user(&store, "p1");
        let view = PatientDashboard::new(&patient, &store);

        assert_eq!(view.specialties(), vec!["Cardiology", "Dermatology"]);

        let cardiologists: Vec<&str> = view
            .doctors_for(Some("Cardiology"))
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(cardiologists, vec!["d1", "d3"]);
        assert_eq!(view.doctors_for(None).len(), 3);
        assert!(view.doctors_for(Some("Oncology")).is_empty());
    }

    #[tokio::test]
    async fn test_request_appointment() {
        let mut store = loaded_store().await;
        let patient = user(&store, "p2");

        let incomplete = BookingForm {
            doctor_id: "d2".to_string(),
            date: "2025-03-01".to_string(),
            time: String::new(),
            reason: "Mole check".to_string(),
        };
        assert_eq!(
            request_appointment(&mut store, &patient, incomplete),
            ActionMessage::MissingFields
        );
        assert_eq!(store.appointments().len(), 4);

        let form = BookingForm {
            doctor_id: "d2".to_string(),
            date: "2025-03-01".to_string(),
            time: "10:30".to_string(),
            reason: "Mole check".to_string(),
        };
        assert_eq!(
            request_appointment(&mut store, &patient, form),
            ActionMessage::RequestSubmitted
        );

        let created = store.appointments().last().unwrap();
        assert_eq!(created.patient_id, "p2");
        assert_eq!(created.status, AppointmentStatus::Pending);

        let blank_reason = BookingForm {
            doctor_id: "d2".to_string(),
            date: "2025-03-02".to_string(),
            time: "11:00".to_string(),
            reason: " ".to_string(),
        };
        assert_eq!(
            request_appointment(&mut store, &patient, blank_reason),
            ActionMessage::RequestSubmitted
        );
        assert_eq!(store.appointments().len(), 6);
    }

    #[tokio::test]
    async fn test_cancel() {
        let mut store = loaded_store().await;
        assert_eq!(cancel(&mut store, "a1"), ActionMessage::Cancelled);
        assert_eq!(store.find("a1").unwrap().status, AppointmentStatus::Cancelled);
    }
}

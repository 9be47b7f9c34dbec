use chrono::NaiveDate;

use crate::appointments::AppointmentStore;
use crate::fixtures::FixtureSource;
use crate::types::{Appointment, AppointmentRequest, AppointmentStatus, Role, User};

use super::{
    by_time, cancel_message, display_name, iso_date, newest_first, on_date, status_message,
    ActionMessage, StatusCounts, RECEPTION_TIME_SLOTS,
};

/// Optional status and doctor constraints; `None` means "all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub doctor_id: Option<String>,
}

impl AppointmentFilter {
    pub fn matches(&self, appt: &Appointment) -> bool {
        if self.status.is_some_and(|status| appt.status != status) {
            return false;
        }
        if self.doctor_id.as_ref().is_some_and(|id| &appt.doctor_id != id) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoctorLoad<'a> {
    pub doctor: &'a User,
    pub today: usize,
    pub total: usize,
}

pub struct ReceptionistDashboard<'a> {
    appointments: &'a [Appointment],
    doctors: &'a [User],
    directory: &'a [User],
}

impl<'a> ReceptionistDashboard<'a> {
    pub fn new<F: FixtureSource>(store: &'a AppointmentStore<F>) -> Self {
        Self {
            appointments: store.appointments(),
            doctors: store.doctors(),
            directory: store.directory(),
        }
    }

    pub fn appointments(&self, filter: &AppointmentFilter) -> Vec<&'a Appointment> {
        newest_first(
            self.appointments
                .iter()
                .filter(|appt| filter.matches(appt))
                .collect(),
        )
    }

    pub fn schedule(&self, date: NaiveDate) -> Vec<&'a Appointment> {
        by_time(on_date(self.appointments, date))
    }

    pub fn today(&self) -> Vec<&'a Appointment> {
        on_date(self.appointments, super::today())
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::tally(self.appointments)
    }

    pub fn patients(&self) -> Vec<&'a User> {
        self.directory
            .iter()
            .filter(|user| user.role() == Role::Patient)
            .collect()
    }

    pub fn doctors(&self) -> &'a [User] {
        self.doctors
    }

    /// Appointment totals per doctor, with `day` counted separately.
    pub fn doctor_load(&self, day: NaiveDate) -> Vec<DoctorLoad<'a>> {
        let day = iso_date(day);
        self.doctors
            .iter()
            .map(|doctor| {
                let own = self
                    .appointments
                    .iter()
                    .filter(|appt| appt.doctor_id == doctor.id);
                DoctorLoad {
                    doctor,
                    today: own.clone().filter(|appt| appt.date == day).count(),
                    total: own.count(),
                }
            })
            .collect()
    }

    pub fn name_of(&self, user_id: &str) -> String {
        display_name(self.directory, user_id)
    }

    pub fn time_slots(&self) -> &'static [&'static str] {
        &RECEPTION_TIME_SLOTS
    }
}

pub fn book<F: FixtureSource>(
    store: &mut AppointmentStore<F>,
    request: AppointmentRequest,
) -> ActionMessage {
    let fields = [
        &request.patient_id,
        &request.doctor_id,
        &request.date,
        &request.time,
        &request.reason,
    ];
    if fields.iter().any(|field| field.is_empty()) {
        return ActionMessage::MissingFields;
    }

    store.create_appointment(request);
    ActionMessage::Created
}

pub fn set_status<F: FixtureSource>(
    store: &mut AppointmentStore<F>,
    appointment_id: &str,
    status: AppointmentStatus,
) -> ActionMessage {
    status_message(
        store.update_appointment_status(appointment_id, status, None),
        status,
    )
}

pub fn cancel<F: FixtureSource>(store: &mut AppointmentStore<F>, appointment_id: &str) -> ActionMessage {
    cancel_message(store.cancel_appointment(appointment_id))
}

use chrono::Utc;
use tokio::sync::broadcast;

use crate::error::ClinicError;
use crate::events::{self, StoreEvent};
use crate::fixtures::{self, FixtureSource};
use crate::types::{Account, Appointment, AppointmentRequest, AppointmentStatus, User};

/// In-memory appointment list plus the doctor roster and user directory it
/// is rendered against. Mutations never reach the fixtures.
pub struct AppointmentStore<F> {
    fixtures: F,
    appointments: Vec<Appointment>,
    doctors: Vec<User>,
    directory: Vec<User>,
    loading: bool,
    events: broadcast::Sender<StoreEvent>,
}

struct Snapshot {
    appointments: Vec<Appointment>,
    doctors: Vec<User>,
    directory: Vec<User>,
}

impl<F: FixtureSource> AppointmentStore<F> {
    /// Empty store, marked as loading until the first `load` completes.
    pub fn new(fixtures: F) -> Self {
        Self {
            fixtures,
            appointments: Vec::new(),
            doctors: Vec::new(),
            directory: Vec::new(),
            loading: true,
            events: events::channel(),
        }
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn doctors(&self) -> &[User] {
        &self.doctors
    }

    /// Every fixture user, without credentials
    pub fn directory(&self) -> &[User] {
        &self.directory
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn find(&self, appointment_id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|appt| appt.id == appointment_id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Replace the list and roster with the fixture contents. On failure the
    /// current state is kept.
    pub async fn load(&mut self) {
        self.loading = true;

        match self.fetch().await {
            Ok(snapshot) => {
                tracing::info!(
                    "Loaded {} appointments and {} doctors",
                    snapshot.appointments.len(),
                    snapshot.doctors.len()
                );
                self.appointments = snapshot.appointments;
                self.doctors = snapshot.doctors;
                self.directory = snapshot.directory;
                events::publish(
                    &self.events,
                    StoreEvent::AppointmentsLoaded {
                        appointments: self.appointments.len(),
                        doctors: self.doctors.len(),
                    },
                );
            }
            Err(e) => tracing::error!("Error loading data: {}", e),
        }

        self.loading = false;
    }

    /// Reload from the fixtures, dropping any local changes.
    pub async fn refresh(&mut self) {
        self.load().await;
    }

    pub fn create_appointment(&mut self, request: AppointmentRequest) -> Appointment {
        let now = Utc::now().to_rfc3339();
        let appointment = Appointment {
            id: self.next_appointment_id(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            date: request.date,
            time: request.time,
            status: AppointmentStatus::Pending,
            reason: request.reason,
            notes: Some(String::new()),
            created_at: now.clone(),
            updated_at: now,
        };
        tracing::info!(
            "Created appointment {} for patient {} with doctor {}",
            appointment.id,
            appointment.patient_id,
            appointment.doctor_id
        );

        self.appointments.push(appointment.clone());
        events::publish(
            &self.events,
            StoreEvent::AppointmentCreated {
                appointment: appointment.clone(),
            },
        );
        appointment
    }

    /// Set the status, and the notes when non-empty ones are given. Any
    /// status may follow any other. An unknown id still reports success.
    pub fn update_appointment_status(
        &mut self,
        appointment_id: &str,
        status: AppointmentStatus,
        notes: Option<&str>,
    ) -> bool {
        self.modify(appointment_id, |appt| {
            appt.status = status;
            if let Some(notes) = notes.filter(|n| !n.is_empty()) {
                appt.notes = Some(notes.to_string());
            }
        })
    }

    pub fn cancel_appointment(&mut self, appointment_id: &str) -> bool {
        self.update_appointment_status(appointment_id, AppointmentStatus::Cancelled, None)
    }

    pub fn reschedule_appointment(&mut self, appointment_id: &str, date: &str, time: &str) -> bool {
        self.modify(appointment_id, |appt| {
            appt.date = date.to_string();
            appt.time = time.to_string();
        })
    }

    async fn fetch(&self) -> Result<Snapshot, ClinicError> {
        let appointments = fixtures::load_appointments(&self.fixtures).await?;
        let users = fixtures::load_users(&self.fixtures).await?;

        let doctors = users
            .doctors
            .iter()
            .cloned()
            .map(Account::into_user)
            .collect();
        let directory = users
            .into_accounts()
            .into_iter()
            .map(Account::into_user)
            .collect();

        Ok(Snapshot {
            appointments,
            doctors,
            directory,
        })
    }

    fn modify(&mut self, appointment_id: &str, change: impl FnOnce(&mut Appointment)) -> bool {
        let Some(appt) = self
            .appointments
            .iter_mut()
            .find(|appt| appt.id == appointment_id)
        else {
            tracing::warn!("No appointment with id {}; nothing changed", appointment_id);
            return true;
        };

        change(appt);
        appt.updated_at = Utc::now().to_rfc3339();
        tracing::info!("Updated appointment {} ({})", appt.id, appt.status);

        let event = StoreEvent::AppointmentUpdated {
            appointment: appt.clone(),
        };
        events::publish(&self.events, event);
        true
    }

    /// `appt_<epoch millis>`, moved forward until no existing id matches.
    fn next_appointment_id(&self) -> String {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = format!("appt_{}", millis);
            if self.find(&id).is_none() {
                return id;
            }
            millis += 1;
        }
    }
}

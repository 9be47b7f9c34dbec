use serde::Serialize;
use tokio::sync::broadcast;

use crate::types::{Appointment, Role};

const EVENT_CAPACITY: usize = 64;

/// Change notification published by the stores to their subscribers
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    LoggedIn { user_id: String, role: Role },
    Registered { user_id: String, role: Role },
    LoggedOut,
    SessionRestored { user_id: String, role: Role },
    AppointmentsLoaded { appointments: usize, doctors: usize },
    AppointmentCreated { appointment: Appointment },
    AppointmentUpdated { appointment: Appointment },
}

impl StoreEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreEvent::LoggedIn { .. } => "logged_in",
            StoreEvent::Registered { .. } => "registered",
            StoreEvent::LoggedOut => "logged_out",
            StoreEvent::SessionRestored { .. } => "session_restored",
            StoreEvent::AppointmentsLoaded { .. } => "appointments_loaded",
            StoreEvent::AppointmentCreated { .. } => "appointment_created",
            StoreEvent::AppointmentUpdated { .. } => "appointment_updated",
        }
    }
}

pub(crate) fn channel() -> broadcast::Sender<StoreEvent> {
    let (sender, _) = broadcast::channel(EVENT_CAPACITY);
    sender
}

/// Publish to current subscribers. Having none is not an error.
pub(crate) fn publish(sender: &broadcast::Sender<StoreEvent>, event: StoreEvent) {
    tracing::debug!("Store event: {}", event.kind());
    let _ = sender.send(event);
}

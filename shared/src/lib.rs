pub mod appointments;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod fixtures;
pub mod session;
pub mod storage;
pub mod types;

use appointments::AppointmentStore;
use fixtures::FixtureSource;
use session::SessionStore;
use storage::KeyValueStore;

/// Both stores, constructed once at startup and handed to the views by reference
pub struct AppState<F, S> {
    pub session: SessionStore<F, S>,
    pub appointments: AppointmentStore<F>,
}

impl<F, S> AppState<F, S>
where
    F: FixtureSource + Clone,
    S: KeyValueStore,
{
    /// Restores the session from storage. Appointments stay empty until
    /// `appointments.load()` runs.
    pub fn new(fixtures: F, storage: S) -> Self {
        let mut session = SessionStore::new(fixtures.clone(), storage);
        session.restore_from_storage();
        Self {
            session,
            appointments: AppointmentStore::new(fixtures),
        }
    }
}

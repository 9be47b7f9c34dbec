use tokio::sync::broadcast;

use crate::error::ClinicError;
use crate::events::{self, StoreEvent};
use crate::fixtures::{self, FixtureSource};
use crate::storage::{KeyValueStore, SESSION_KEY};
use crate::types::{Account, RegisterRequest, User};

/// Holds the single authenticated identity, mirrored to durable storage.
pub struct SessionStore<F, S> {
    fixtures: F,
    storage: S,
    user: Option<User>,
    events: broadcast::Sender<StoreEvent>,
}

impl<F: FixtureSource, S: KeyValueStore> SessionStore<F, S> {
    /// Signed-out store. Call `restore_from_storage` to pick up a session
    /// left by an earlier run.
    pub fn new(fixtures: F, storage: S) -> Self {
        Self {
            fixtures,
            storage,
            user: None,
            events: events::channel(),
        }
    }

    /// Sign in as the user held in storage, if any. A stored entry that does
    /// not parse is discarded and the session stays signed out.
    pub fn restore_from_storage(&mut self) -> bool {
        let Some(user) = restore_user(&self.storage) else {
            return false;
        };
        tracing::info!("Restored session for user {}", user.id);

        let event = StoreEvent::SessionRestored {
            user_id: user.id.clone(),
            role: user.role(),
        };
        self.user = Some(user);
        events::publish(&self.events, event);
        true
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Check credentials against the user fixture. Any failure, including an
    /// unreadable fixture, is reported as `false`.
    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        tracing::info!("Authenticating user: {}", email);

        let account = match self.find_account(email, password).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                tracing::info!("No user matches the supplied credentials");
                return false;
            }
            Err(e) => {
                tracing::error!("Login error: {}", e);
                return false;
            }
        };

        let user = account.into_user();
        let event = StoreEvent::LoggedIn {
            user_id: user.id.clone(),
            role: user.role(),
        };
        if !self.establish(user) {
            return false;
        }
        events::publish(&self.events, event);
        true
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::info!("Logging out user {}", user.id);
        }
        if let Err(e) = self.storage.remove(SESSION_KEY) {
            tracing::error!("Failed to clear stored session: {}", e);
        }
        events::publish(&self.events, StoreEvent::LoggedOut);
    }

    /// Create a local identity and sign it in. Nothing is checked against
    /// the fixtures, so duplicate emails are accepted.
    pub fn register(&mut self, request: RegisterRequest) -> bool {
        let role = request.profile.role();
        let user = User {
            id: format!("{}_{}", role, chrono::Utc::now().timestamp_millis()),
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            avatar: request.avatar,
            profile: request.profile,
        };
        tracing::info!("Registering {} {}", role, user.id);

        let event = StoreEvent::Registered {
            user_id: user.id.clone(),
            role,
        };
        if !self.establish(user) {
            return false;
        }
        events::publish(&self.events, event);
        true
    }

    async fn find_account(&self, email: &str, password: &str) -> Result<Option<Account>, ClinicError> {
        let users = fixtures::load_users(&self.fixtures).await?;
        Ok(users
            .into_accounts()
            .into_iter()
            .find(|account| account.matches(email, password)))
    }

    /// Persist first; the in-memory session only changes once storage has it.
    fn establish(&mut self, user: User) -> bool {
        let stored = serde_json::to_string(&user)
            .map_err(ClinicError::from)
            .and_then(|json| self.storage.set(SESSION_KEY, &json));

        match stored {
            Ok(()) => {
                self.user = Some(user);
                true
            }
            Err(e) => {
                tracing::error!("Failed to store session: {}", e);
                false
            }
        }
    }
}

fn restore_user<S: KeyValueStore>(storage: &S) -> Option<User> {
    let raw = match storage.get(SESSION_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::error!("Failed to read stored session: {}", e);
            return None;
        }
    };

    match serde_json::from_str::<User>(&raw) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::error!("Error parsing stored user: {}", e);
            if let Err(e) = storage.remove(SESSION_KEY) {
                tracing::error!("Failed to discard stored session: {}", e);
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{StaticFixtures, USERS_FIXTURE};
    use crate::storage::MemoryStorage;
    use crate::types::{PatientProfile, Profile, Role};
    use std::sync::Arc;

    /// Reads and removes work; every write is refused.
    struct ReadOnlyStorage(MemoryStorage);

    impl KeyValueStore for ReadOnlyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, ClinicError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), ClinicError> {
            Err(ClinicError::Storage(format!("{} is read-only", key)))
        }

        fn remove(&self, key: &str) -> Result<(), ClinicError> {
            self.0.remove(key)
        }
    }

    fn store() -> (SessionStore<StaticFixtures, Arc<MemoryStorage>>, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(StaticFixtures::bundled(), Arc::clone(&storage));
        (store, storage)
    }

    fn new_patient() -> RegisterRequest {
        RegisterRequest {
            email: "patient1@example.com".to_string(),
            password: "hunter2".to_string(),
            first_name: "New".to_string(),
            last_name: "Patient".to_string(),
            phone: "555".to_string(),
            avatar: None,
            profile: Profile::Patient(PatientProfile {
                date_of_birth: "2000-02-02".to_string(),
                medical_history: None,
                insurance_id: None,
            }),
        }
    }

    fn stored_json(storage: &MemoryStorage) -> serde_json::Value {
        let raw = storage.get(SESSION_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_login_with_fixture_credentials() {
        let (mut session, storage) = store();
        assert!(!session.is_authenticated());

        assert!(session.login("patient1@example.com", "patient123").await);
        assert!(session.is_authenticated());
        assert_eq!(session.user().unwrap().id, "p1");

        let stored = stored_json(&storage);
        assert_eq!(stored["id"], "p1");
        assert_eq!(stored["role"], "patient");
        assert!(stored.get("password").is_none());
    }

    #[tokio::test]
    async fn test_login_searches_every_role_group() {
        let (mut session, _) = store();
        assert!(session.login("reception@example.com", "reception123").await);
        assert_eq!(session.user().unwrap().role(), Role::Receptionist);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let (mut session, storage) = store();

        assert!(!session.login("patient1@example.com", "wrong").await);
        assert!(!session.login("nobody@example.com", "patient123").await);
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_fails_quietly_on_broken_fixture() {
        let storage = Arc::new(MemoryStorage::new());
        let fixtures = StaticFixtures::new().with(USERS_FIXTURE, "not json");
        let mut session = SessionStore::new(fixtures, storage);

        assert!(!session.login("patient1@example.com", "patient123").await);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_memory_and_storage() {
        let (mut session, storage) = store();
        let mut events = session.subscribe();
        assert!(session.login("doctor1@example.com", "doctor123").await);

        session.logout();
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);

        assert_eq!(events.try_recv().unwrap().kind(), "logged_in");
        assert_eq!(events.try_recv().unwrap(), StoreEvent::LoggedOut);
    }

    #[tokio::test]
    async fn test_session_restored_from_storage() {
        let (mut session, storage) = store();
        assert!(session.login("doctor2@example.com", "doctor123").await);
        drop(session);

        let mut restored = SessionStore::new(StaticFixtures::bundled(), Arc::clone(&storage));
        assert!(!restored.is_authenticated());
        let mut events = restored.subscribe();

        assert!(restored.restore_from_storage());
        let user = restored.user().unwrap();
        assert_eq!(user.id, "d2");
        assert_eq!(user.as_doctor().unwrap().specialty, "Dermatology");
        assert_eq!(
            events.try_recv().unwrap(),
            StoreEvent::SessionRestored {
                user_id: "d2".to_string(),
                role: Role::Doctor,
            }
        );
    }

    #[test]
    fn test_restore_with_empty_storage() {
        let (mut session, _) = store();
        let mut events = session.subscribe();

        assert!(!session.restore_from_storage());
        assert!(!session.is_authenticated());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_corrupt_stored_session_is_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(SESSION_KEY, "{not json").unwrap();

        let mut session = SessionStore::new(StaticFixtures::bundled(), Arc::clone(&storage));
        assert!(!session.restore_from_storage());
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_storage_write_failure_leaves_session_signed_out() {
        let mut session = SessionStore::new(
            StaticFixtures::bundled(),
            ReadOnlyStorage(MemoryStorage::new()),
        );
        let mut events = session.subscribe();

        assert!(!session.login("patient1@example.com", "patient123").await);
        assert!(!session.is_authenticated());

        assert!(!session.register(new_patient()));
        assert!(!session.is_authenticated());
        assert_eq!(session.storage().get(SESSION_KEY).unwrap(), None);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_register_synthesizes_id_and_strips_password() {
        let (mut session, storage) = store();

        assert!(session.register(new_patient()));
        let user = session.user().unwrap();
        assert!(user.id.starts_with("patient_"));
        assert_eq!(user.email, "patient1@example.com");

        let stored = stored_json(&storage);
        assert_eq!(stored["id"], user.id.as_str());
        assert!(stored.get("password").is_none());
    }
}

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ClinicError;
use crate::types::{Appointment, AppointmentsFixture, UsersFixture};

pub const APPOINTMENTS_FIXTURE: &str = "appointments.json";
pub const USERS_FIXTURE: &str = "users.json";

/// Read-only source of the static JSON documents that stand in for a backend.
pub trait FixtureSource {
    fn read(&self, name: &str) -> impl Future<Output = Result<Vec<u8>, ClinicError>> + Send;
}

/// Fixtures served from a data directory on disk
#[derive(Debug, Clone)]
pub struct DirFixtures {
    root: PathBuf,
}

impl DirFixtures {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FixtureSource for DirFixtures {
    async fn read(&self, name: &str) -> Result<Vec<u8>, ClinicError> {
        let path = self.root.join(name);
        tracing::debug!("Reading fixture {}", path.display());

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ClinicError::FixtureNotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Fixtures held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticFixtures {
    documents: Arc<HashMap<String, Vec<u8>>>,
}

impl StaticFixtures {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sample clinic data shipped in the repository's `data/` directory.
    pub fn bundled() -> Self {
        Self::new()
            .with(APPOINTMENTS_FIXTURE, include_str!("../../data/appointments.json"))
            .with(USERS_FIXTURE, include_str!("../../data/users.json"))
    }

    pub fn with(mut self, name: &str, contents: impl Into<Vec<u8>>) -> Self {
        Arc::make_mut(&mut self.documents).insert(name.to_string(), contents.into());
        self
    }
}

impl FixtureSource for StaticFixtures {
    async fn read(&self, name: &str) -> Result<Vec<u8>, ClinicError> {
        self.documents
            .get(name)
            .cloned()
            .ok_or_else(|| ClinicError::FixtureNotFound(name.to_string()))
    }
}

pub async fn load_users<F: FixtureSource>(source: &F) -> Result<UsersFixture, ClinicError> {
    let bytes = source.read(USERS_FIXTURE).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub async fn load_appointments<F: FixtureSource>(
    source: &F,
) -> Result<Vec<Appointment>, ClinicError> {
    let bytes = source.read(APPOINTMENTS_FIXTURE).await?;
    let fixture: AppointmentsFixture = serde_json::from_slice(&bytes)?;
    Ok(fixture.appointments)
}

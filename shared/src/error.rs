use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClinicError {
    #[error("fixture not found: {0}")]
    FixtureNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("unknown appointment status: {0}")]
    UnknownStatus(String),
}

use std::env;
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_STORAGE_DIR: &str = ".clinic-storage";

/// Runtime locations, taken from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding `appointments.json` and `users.json`
    pub data_dir: PathBuf,
    /// Directory backing the durable key-value storage
    pub storage_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("CLINIC_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let storage_dir =
            lookup("CLINIC_STORAGE_DIR").unwrap_or_else(|| DEFAULT_STORAGE_DIR.to_string());

        Self {
            data_dir: PathBuf::from(data_dir),
            storage_dir: PathBuf::from(storage_dir),
        }
    }
}

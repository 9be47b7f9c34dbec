use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::ClinicError;

/// Storage key holding the serialized session user.
pub const SESSION_KEY: &str = "clinicUser";

/// Durable string key-value storage, the local equivalent of browser storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClinicError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ClinicError>;
    fn remove(&self, key: &str) -> Result<(), ClinicError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, ClinicError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClinicError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), ClinicError> {
        (**self).remove(key)
    }
}

/// One file per key under a storage directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ClinicError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ClinicError> {
        if key.is_empty() || key.starts_with('.') || key.contains(['/', '\\']) {
            return Err(ClinicError::Storage(format!("invalid key: {:?}", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ClinicError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClinicError> {
        fs::write(self.path_for(key)?, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClinicError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, ClinicError> {
        self.entries
            .lock()
            .map_err(|_| ClinicError::Storage("memory storage lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ClinicError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClinicError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClinicError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("nested")).unwrap();

        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
        storage.set(SESSION_KEY, "{\"id\":\"p1\"}").unwrap();
        assert_eq!(storage.get(SESSION_KEY).unwrap().as_deref(), Some("{\"id\":\"p1\"}"));

        // Survives reopening the same directory
        let reopened = FileStorage::open(storage.root()).unwrap();
        assert!(reopened.get(SESSION_KEY).unwrap().is_some());

        reopened.remove(SESSION_KEY).unwrap();
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);

        // Removing an absent key is fine
        storage.remove(SESSION_KEY).unwrap();
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        assert!(storage.set("../escape", "x").is_err());
        assert!(storage.get("").is_err());
    }

    #[test]
    fn test_memory_storage_shared_through_arc() {
        let storage = Arc::new(MemoryStorage::new());
        let handle = Arc::clone(&storage);

        handle.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        storage.remove("k").unwrap();
        assert_eq!(handle.get("k").unwrap(), None);
    }
}

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

pub const STATE_FILE: &str = "client_state.json";
pub const DARK_MODE_KEY: &str = "darkMode";
pub const SESSION_KEY: &str = "session";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Identity {
            username: username.into(),
        }
    }
}

/// Key/value file with fixed key names, written through on every change
pub struct LocalStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl LocalStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(STATE_FILE);
        let values = match fs::read_to_string(&path) {
            Ok(text) if !text.trim().is_empty() => serde_json::from_str(&text)?,
            Ok(_) => Map::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        debug!("Opened client state at {}", path.display());
        Ok(LocalStore { path, values })
    }

    pub fn identity(&self) -> Option<Identity> {
        self.values
            .get(SESSION_KEY)
            .and_then(Value::as_str)
            .filter(|username| !username.is_empty())
            .map(Identity::new)
    }

    pub fn set_identity(&mut self, identity: &Identity) -> Result<(), StoreError> {
        info!("Signed in as {}", identity.username);
        self.values
            .insert(SESSION_KEY.to_string(), Value::String(identity.username.clone()));
        self.persist()
    }

    pub fn clear_identity(&mut self) -> Result<(), StoreError> {
        if self.values.remove(SESSION_KEY).is_some() {
            info!("Cleared signed-in identity");
        }
        self.persist()
    }

    pub fn dark_mode(&self) -> bool {
        self.values
            .get(DARK_MODE_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_dark_mode(&mut self, enabled: bool) -> Result<(), StoreError> {
        self.values.insert(DARK_MODE_KEY.to_string(), Value::Bool(enabled));
        self.persist()
    }

    fn persist(&self) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, text).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("chess-client-test-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = scratch_dir();
        {
            let mut store = LocalStore::open(&dir).unwrap();
            assert_eq!(store.identity(), None);
            assert!(!store.dark_mode());
            store.set_identity(&Identity::new("alice")).unwrap();
            store.set_dark_mode(true).unwrap();
        }

        let mut store = LocalStore::open(&dir).unwrap();
        assert_eq!(store.identity(), Some(Identity::new("alice")));
        assert!(store.dark_mode());

        store.clear_identity().unwrap();
        let reopened = LocalStore::open(&dir).unwrap();
        assert_eq!(reopened.identity(), None);
        assert!(reopened.dark_mode());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(STATE_FILE), "{not json").unwrap();
        assert!(matches!(LocalStore::open(&dir), Err(StoreError::Corrupt(_))));
        fs::remove_dir_all(&dir).unwrap();
    }
}

//! JSON file backend

use std::fs;
use std::path::{Path, PathBuf};

use super::{StateStore, StoredState};
use crate::error::{EphemeraError, Result};

/// Stores state as pretty-printed JSON, replaced atomically on each write
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<StoredState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let state = serde_json::from_str(&content).map_err(|e| {
            EphemeraError::Storage(format!("{}: {}", self.path.display(), e))
        })?;
        Ok(Some(state))
    }

    fn persist(&self, state: &StoredState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Color, Container, Icon};

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_persist_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("state.json"));

        let mut state = StoredState::default();
        let mut container = Container::new("tmp1".to_string(), 1, Color::Green, Icon::Gift, true);
        container.history.insert("https://a.example".to_string(), 7);
        state.containers.insert("c1".to_string(), container);
        state.container_counter = 1;
        state.statistics.containers_deleted = 4;

        store.persist(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(path);
        assert!(matches!(store.load(), Err(EphemeraError::Storage(_))));
    }
}

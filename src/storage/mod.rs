//! Persisted engine state
//!
//! The engine hands a [`StoredState`] snapshot to a [`StateStore`] after every
//! mutation that has to survive a restart.

mod json;

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::container::Container;
use crate::error::Result;

pub use json::JsonFileStore;

/// Counters for containers removed by history-erasing runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletesHistoryStatistics {
    pub containers_deleted: u64,
    pub cookies_deleted: u64,
    pub urls_deleted: u64,
}

/// Cumulative removal statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub containers_deleted: u64,
    pub cookies_deleted: u64,
    pub deletes_history: DeletesHistoryStatistics,
}

/// Everything the engine persists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredState {
    pub containers: BTreeMap<String, Container>,
    /// Last number handed out in `keep` mode
    pub container_counter: u32,
    pub statistics: Statistics,
}

/// Persistence backend
pub trait StateStore: Send + Sync {
    /// Previously persisted state, if any
    fn load(&self) -> Result<Option<StoredState>>;

    fn persist(&self, state: &StoredState) -> Result<()>;
}

/// Keeps the last persisted state in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<StoredState>>,
    writes: Mutex<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state
    pub fn with_state(state: StoredState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            writes: Mutex::new(0),
        }
    }

    pub fn snapshot(&self) -> Option<StoredState> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of persist calls so far
    pub fn writes(&self) -> u64 {
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<StoredState>> {
        Ok(self.snapshot())
    }

    fn persist(&self, state: &StoredState) -> Result<()> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

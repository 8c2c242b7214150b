//! In-process host used by the simulator and tests

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Host, HostError, TabId, TabPlacement};
use crate::container::{Color, Icon, DEFAULT_IDENTITY};

#[derive(Debug, Clone)]
pub struct HostIdentity {
    pub name: String,
    pub color: Color,
    pub icon: Icon,
}

#[derive(Debug, Clone)]
pub struct HostTab {
    pub identity: String,
    pub url: Option<String>,
    pub private: bool,
    pub placement: TabPlacement,
}

#[derive(Debug, Default)]
struct HostState {
    identities: BTreeMap<String, HostIdentity>,
    tabs: BTreeMap<TabId, HostTab>,
    next_identity: u64,
    next_tab: TabId,
    deleted_history: Vec<String>,
    notifications: Vec<(String, String)>,
    failing_destroy: HashSet<String>,
    destroy_calls: Vec<String>,
}

/// A host that keeps identities and tabs in memory
#[derive(Debug)]
pub struct InMemoryHost {
    state: Mutex<HostState>,
    notifications_permitted: AtomicBool,
    history_permitted: AtomicBool,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHost {
    /// Create a host with every capability granted
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HostState::default()),
            notifications_permitted: AtomicBool::new(true),
            history_permitted: AtomicBool::new(true),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_notifications_permitted(&self, permitted: bool) {
        self.notifications_permitted.store(permitted, Ordering::SeqCst);
    }

    pub fn set_history_permitted(&self, permitted: bool) {
        self.history_permitted.store(permitted, Ordering::SeqCst);
    }

    /// Make destruction of an identity fail until cleared
    pub fn set_destroy_failure(&self, identity: &str, failing: bool) {
        let mut state = self.lock();
        if failing {
            state.failing_destroy.insert(identity.to_string());
        } else {
            state.failing_destroy.remove(identity);
        }
    }

    /// Open a tab outside the engine, e.g. a tab the user opened
    pub fn open_tab(&self, identity: &str, url: Option<&str>) -> TabId {
        self.insert_tab(identity, url, false, TabPlacement::default())
    }

    pub fn open_private_tab(&self, url: Option<&str>) -> TabId {
        self.insert_tab(DEFAULT_IDENTITY, url, true, TabPlacement::default())
    }

    fn insert_tab(
        &self,
        identity: &str,
        url: Option<&str>,
        private: bool,
        placement: TabPlacement,
    ) -> TabId {
        let mut state = self.lock();
        state.next_tab += 1;
        let id = state.next_tab;
        state.tabs.insert(
            id,
            HostTab {
                identity: identity.to_string(),
                url: url.map(str::to_string),
                private,
                placement,
            },
        );
        id
    }

    /// Close a tab, returning the identity it belonged to
    pub fn close_tab(&self, tab_id: TabId) -> Option<String> {
        self.lock().tabs.remove(&tab_id).map(|tab| tab.identity)
    }

    pub fn tab(&self, tab_id: TabId) -> Option<HostTab> {
        self.lock().tabs.get(&tab_id).cloned()
    }

    pub fn has_identity(&self, identity: &str) -> bool {
        self.lock().identities.contains_key(identity)
    }

    pub fn identity(&self, identity: &str) -> Option<HostIdentity> {
        self.lock().identities.get(identity).cloned()
    }

    pub fn identities(&self) -> Vec<String> {
        self.lock().identities.keys().cloned().collect()
    }

    pub fn deleted_history(&self) -> Vec<String> {
        self.lock().deleted_history.clone()
    }

    /// Notifications shown so far, as (title, message)
    pub fn notifications(&self) -> Vec<(String, String)> {
        self.lock().notifications.clone()
    }

    /// Every identity destruction attempt, in order
    pub fn destroy_calls(&self) -> Vec<String> {
        self.lock().destroy_calls.clone()
    }
}

impl Host for InMemoryHost {
    async fn create_identity(&self, name: &str, color: Color, icon: Icon) -> Result<String, HostError> {
        let mut state = self.lock();
        state.next_identity += 1;
        let identity = format!("container-{}", state.next_identity);
        state.identities.insert(
            identity.clone(),
            HostIdentity {
                name: name.to_string(),
                color,
                icon,
            },
        );
        Ok(identity)
    }

    async fn destroy_identity(&self, identity: &str) -> Result<bool, HostError> {
        let mut state = self.lock();
        state.destroy_calls.push(identity.to_string());
        if state.failing_destroy.contains(identity) {
            return Err(HostError::new("destroy_identity", format!("{} is busy", identity)));
        }
        Ok(state.identities.remove(identity).is_some())
    }

    async fn create_tab(
        &self,
        identity: &str,
        url: Option<&str>,
        placement: TabPlacement,
    ) -> Result<TabId, HostError> {
        if identity != DEFAULT_IDENTITY && !self.has_identity(identity) {
            return Err(HostError::new("create_tab", format!("unknown identity {}", identity)));
        }
        Ok(self.insert_tab(identity, url, false, placement))
    }

    async fn query_tabs(&self, identity: &str) -> Result<Vec<TabId>, HostError> {
        Ok(self
            .lock()
            .tabs
            .iter()
            .filter(|(_, tab)| tab.identity == identity)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn remove_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        match self.close_tab(tab_id) {
            Some(_) => Ok(()),
            None => Err(HostError::new("remove_tab", format!("no tab {}", tab_id))),
        }
    }

    async fn delete_history_entry(&self, url: &str) -> Result<(), HostError> {
        self.lock().deleted_history.push(url.to_string());
        Ok(())
    }

    async fn show_notification(&self, title: &str, message: &str) {
        self.lock()
            .notifications
            .push((title.to_string(), message.to_string()));
    }

    async fn only_private_or_no_tabs(&self) -> Result<bool, HostError> {
        Ok(self.lock().tabs.values().all(|tab| tab.private))
    }

    fn notifications_permitted(&self) -> bool {
        self.notifications_permitted.load(Ordering::SeqCst)
    }

    fn history_permitted(&self) -> bool {
        self.history_permitted.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identity_roundtrip() {
        let host = InMemoryHost::new();
        let id = host.create_identity("tmp1", Color::Blue, Icon::Circle).await.unwrap();
        assert!(host.has_identity(&id));
        assert!(host.destroy_identity(&id).await.unwrap());
        assert!(!host.destroy_identity(&id).await.unwrap());
        assert_eq!(host.destroy_calls(), vec![id.clone(), id]);
    }

    #[tokio::test]
    async fn test_destroy_failure_injection() {
        let host = InMemoryHost::new();
        let id = host.create_identity("tmp1", Color::Blue, Icon::Circle).await.unwrap();
        host.set_destroy_failure(&id, true);
        assert!(host.destroy_identity(&id).await.is_err());
        host.set_destroy_failure(&id, false);
        assert!(host.destroy_identity(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_tabs_and_private_state() {
        let host = InMemoryHost::new();
        assert!(host.only_private_or_no_tabs().await.unwrap());
        host.open_private_tab(None);
        assert!(host.only_private_or_no_tabs().await.unwrap());

        let id = host.create_identity("tmp1", Color::Blue, Icon::Circle).await.unwrap();
        let tab = host
            .create_tab(&id, Some("https://a.example"), TabPlacement::default())
            .await
            .unwrap();
        assert!(!host.only_private_or_no_tabs().await.unwrap());
        assert_eq!(host.query_tabs(&id).await.unwrap(), vec![tab]);

        host.remove_tab(tab).await.unwrap();
        assert!(host.query_tabs(&id).await.unwrap().is_empty());
        assert!(host.remove_tab(tab).await.is_err());
    }

    #[tokio::test]
    async fn test_create_tab_unknown_identity() {
        let host = InMemoryHost::new();
        assert!(host
            .create_tab("nope", None, TabPlacement::default())
            .await
            .is_err());
    }
}

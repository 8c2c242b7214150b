//! Registry of live containers
//!
//! The Registry maps container identities to their records. A container is
//! only ever removed from it after the host confirmed destruction.

use std::collections::BTreeMap;

use tracing::debug;

use super::types::{Color, Container};
use crate::error::{EphemeraError, Result};
use crate::host::TabId;

/// Identity of the host's default context, never managed by the engine
pub const DEFAULT_IDENTITY: &str = "default";

/// URLs that are never worth logging for history removal
const IGNORED_HISTORY_URLS: [&str; 2] = ["about:blank", "about:newtab"];

/// Tracks every container created by the engine, keyed by identity
#[derive(Debug, Default, Clone)]
pub struct Registry {
    containers: BTreeMap<String, Container>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from persisted records
    pub fn from_records(containers: BTreeMap<String, Container>) -> Self {
        Self { containers }
    }

    /// Insert a new container record
    pub fn register(&mut self, identity: &str, container: Container) -> Result<&mut Container> {
        if self.containers.contains_key(identity) {
            return Err(EphemeraError::DuplicateIdentity(identity.to_string()));
        }
        Ok(self
            .containers
            .entry(identity.to_string())
            .or_insert(container))
    }

    /// Remove a container record, returning it if it was present
    pub fn remove(&mut self, identity: &str) -> Option<Container> {
        self.containers.remove(identity)
    }

    pub fn get(&self, identity: &str) -> Option<&Container> {
        self.containers.get(identity)
    }

    pub fn get_mut(&mut self, identity: &str) -> Option<&mut Container> {
        self.containers.get_mut(identity)
    }

    pub fn exists(&self, identity: &str) -> bool {
        self.containers.contains_key(identity)
    }

    /// All identities, in ascending order
    pub fn identities(&self) -> Vec<String> {
        self.containers.keys().cloned().collect()
    }

    pub fn records(&self) -> &BTreeMap<String, Container> {
        &self.containers
    }

    pub fn count(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Numbers currently in use
    pub fn numbers(&self) -> Vec<u32> {
        self.containers.values().map(|c| c.number).collect()
    }

    /// Colors currently in use, one entry per container
    pub fn colors(&self) -> Vec<Color> {
        self.containers.values().map(|c| c.color).collect()
    }

    /// Permanent identities belong to the user, not to this engine
    pub fn is_permanent(&self, identity: &str) -> bool {
        identity != DEFAULT_IDENTITY && !self.containers.contains_key(identity)
    }

    /// Flip the clean flag on first network activity.
    ///
    /// Returns true if the flag changed.
    pub fn mark_unclean(&mut self, identity: &str) -> bool {
        match self.containers.get_mut(identity) {
            Some(container) if container.clean => {
                container.clean = false;
                true
            }
            _ => false,
        }
    }

    /// Log a visited URL for a history-erasing container.
    ///
    /// Returns true if the history log changed.
    pub fn record_history_visit(&mut self, identity: &str, url: &str, tab_id: TabId) -> bool {
        if identity == DEFAULT_IDENTITY || IGNORED_HISTORY_URLS.contains(&url) {
            return false;
        }
        match self.containers.get_mut(identity) {
            Some(container) if container.deletes_history => {
                debug!(identity, url, tab_id, "recording history visit");
                container.history.insert(url.to_string(), tab_id);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Icon;

    fn container(number: u32, deletes_history: bool) -> Container {
        Container::new(
            format!("tmp{}", number),
            number,
            Color::Blue,
            Icon::Circle,
            deletes_history,
        )
    }

    #[test]
    fn test_registry_register() {
        let mut registry = Registry::new();
        registry.register("c1", container(1, false)).unwrap();
        assert_eq!(registry.count(), 1);
        assert!(registry.exists("c1"));
    }

    #[test]
    fn test_registry_register_duplicate() {
        let mut registry = Registry::new();
        registry.register("c1", container(1, false)).unwrap();
        let result = registry.register("c1", container(2, false));
        assert!(matches!(result, Err(EphemeraError::DuplicateIdentity(ref id)) if id == "c1"));
        assert_eq!(registry.get("c1").unwrap().number, 1);
    }

    #[test]
    fn test_registry_remove() {
        let mut registry = Registry::new();
        registry.register("c1", container(1, false)).unwrap();
        assert!(registry.remove("c1").is_some());
        assert!(registry.remove("c1").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_is_permanent() {
        let mut registry = Registry::new();
        registry.register("c1", container(1, false)).unwrap();
        assert!(!registry.is_permanent("c1"));
        assert!(!registry.is_permanent(DEFAULT_IDENTITY));
        assert!(registry.is_permanent("user-container"));
    }

    #[test]
    fn test_registry_mark_unclean_once() {
        let mut registry = Registry::new();
        registry.register("c1", container(1, false)).unwrap();
        assert!(registry.mark_unclean("c1"));
        assert!(!registry.mark_unclean("c1"));
        assert!(!registry.get("c1").unwrap().clean);
        assert!(!registry.mark_unclean("missing"));
    }

    #[test]
    fn test_registry_history_only_for_deletes_history() {
        let mut registry = Registry::new();
        registry.register("regular", container(1, false)).unwrap();
        registry.register("erasing", container(2, true)).unwrap();

        assert!(!registry.record_history_visit("regular", "https://a.example", 1));
        assert!(registry.record_history_visit("erasing", "https://a.example", 2));
        assert!(registry.record_history_visit("erasing", "https://a.example", 3));
        assert!(!registry.record_history_visit("erasing", "about:blank", 3));

        let history = &registry.get("erasing").unwrap().history;
        assert_eq!(history.len(), 1);
        assert_eq!(history.get("https://a.example"), Some(&3));
        assert!(registry.get("regular").unwrap().history.is_empty());
    }

    #[test]
    fn test_registry_identities_sorted() {
        let mut registry = Registry::new();
        registry.register("b", container(2, false)).unwrap();
        registry.register("a", container(1, false)).unwrap();
        assert_eq!(registry.identities(), vec!["a".to_string(), "b".to_string()]);
        let mut numbers = registry.numbers();
        numbers.sort_unstable();
        assert_eq!(numbers, vec![1, 2]);
    }
}

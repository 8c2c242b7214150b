//! Tab to container associations

use std::collections::HashMap;

use tracing::debug;

use crate::host::TabId;

/// Maps live tabs to the container they were opened in
#[derive(Debug, Default, Clone)]
pub struct TabTracker {
    tabs: HashMap<TabId, String>,
}

impl TabTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a tab lives in a container. Re-associating is a no-op.
    pub fn associate(&mut self, tab_id: TabId, identity: &str) {
        if self.tabs.get(&tab_id).map(String::as_str) == Some(identity) {
            return;
        }
        self.tabs.insert(tab_id, identity.to_string());
    }

    /// Forget a tab. Unknown tabs are expected and only logged.
    pub fn dissociate(&mut self, tab_id: TabId) -> Option<String> {
        let removed = self.tabs.remove(&tab_id);
        if removed.is_none() {
            debug!(tab_id, "dissociating tab that is not tracked");
        }
        removed
    }

    /// Container a tab was opened in
    pub fn container_of(&self, tab_id: TabId) -> Option<&str> {
        self.tabs.get(&tab_id).map(String::as_str)
    }

    /// Drop every tab pointing at a container, returning how many were dropped
    pub fn forget_container(&mut self, identity: &str) -> usize {
        let before = self.tabs.len();
        self.tabs.retain(|_, owner| owner != identity);
        before - self.tabs.len()
    }

    /// Tabs associated with a container, in ascending order
    pub fn tabs_of(&self, identity: &str) -> Vec<TabId> {
        let mut tabs: Vec<TabId> = self
            .tabs
            .iter()
            .filter(|(_, owner)| owner.as_str() == identity)
            .map(|(tab, _)| *tab)
            .collect();
        tabs.sort_unstable();
        tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_associate_idempotent() {
        let mut tracker = TabTracker::new();
        tracker.associate(1, "a");
        tracker.associate(1, "a");
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.container_of(1), Some("a"));
    }

    #[test]
    fn test_dissociate_missing_is_silent() {
        let mut tracker = TabTracker::new();
        assert_eq!(tracker.dissociate(42), None);
        tracker.associate(1, "a");
        assert_eq!(tracker.dissociate(1), Some("a".to_string()));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_forget_container() {
        let mut tracker = TabTracker::new();
        tracker.associate(1, "a");
        tracker.associate(2, "a");
        tracker.associate(3, "b");
        assert_eq!(tracker.tabs_of("a"), vec![1, 2]);
        assert_eq!(tracker.forget_container("a"), 2);
        assert_eq!(tracker.container_of(1), None);
        assert_eq!(tracker.container_of(3), Some("b"));
    }
}

//! Removal batch collection
//!
//! Containers whose tab closed are buffered per kind. The first entry of a
//! buffer opens a collection window; when it expires the buffer is frozen
//! into a [`RemovalBatch`] and routed. Closing many tabs at once therefore
//! costs one routing decision and one notification.

use std::collections::HashSet;
use std::sync::PoisonError;

use tracing::debug;

use super::Lifecycle;
use crate::container::ContainerKind;
use crate::host::{Host, TabId};

/// Container identities of one kind, frozen at the end of a window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalBatch {
    pub kind: ContainerKind,
    pub identities: Vec<String>,
}

impl RemovalBatch {
    /// Freeze buffered identities, keeping the first occurrence of each
    pub fn freeze(kind: ContainerKind, buffered: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        let identities = buffered
            .into_iter()
            .filter(|identity| seen.insert(identity.clone()))
            .collect();
        Self { kind, identities }
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[derive(Debug, Default)]
pub(super) struct RemovalBuffers {
    regular: Vec<String>,
    deletes_history: Vec<String>,
}

impl RemovalBuffers {
    /// No identity is waiting in either buffer
    pub(super) fn is_empty(&self) -> bool {
        self.regular.is_empty() && self.deletes_history.is_empty()
    }

    fn buffer_mut(&mut self, kind: ContainerKind) -> &mut Vec<String> {
        match kind {
            ContainerKind::Regular => &mut self.regular,
            ContainerKind::DeletesHistory => &mut self.deletes_history,
        }
    }

    /// Append an identity; returns true if it is the first since the last freeze
    fn push(&mut self, kind: ContainerKind, identity: String) -> bool {
        let buffer = self.buffer_mut(kind);
        buffer.push(identity);
        buffer.len() == 1
    }

    fn take(&mut self, kind: ContainerKind) -> Vec<String> {
        std::mem::take(self.buffer_mut(kind))
    }
}

impl<H: Host> Lifecycle<H> {
    /// Queue the container of a closed tab for removal.
    ///
    /// Unknown tabs are ignored. Must be called from within a tokio runtime.
    pub fn enqueue_for_removal(&self, tab_id: TabId) {
        let target = {
            let state = self.shared.state();
            match state.tabs.container_of(tab_id) {
                Some(identity) => state
                    .registry
                    .get(identity)
                    .map(|container| (identity.to_string(), container.kind())),
                None => {
                    debug!(tab_id, "removed tab that is not tracked");
                    return;
                }
            }
        };
        let Some((identity, kind)) = target else {
            debug!(tab_id, "tab belongs to a container that is not registered");
            return;
        };

        debug!(identity = %identity, tab_id, kind = %kind, "queuing container removal");
        let opens_window = self
            .shared
            .buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(kind, identity);
        if !opens_window {
            return;
        }

        self.set_removal_in_progress();
        let window = self.preferences().timings.batch_window();
        debug!(kind = %kind, window_ms = window.as_millis() as u64, "opening collection window");

        let lifecycle = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            lifecycle.flush_batch(kind).await;
        });
    }

    /// Freeze the buffer of a kind and route it
    async fn flush_batch(&self, kind: ContainerKind) {
        let buffered = self
            .shared
            .buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take(kind);
        let batch = RemovalBatch::freeze(kind, buffered);
        // a drain elsewhere may have lowered the guard while the window was open
        self.set_removal_in_progress();
        let policy = self.preferences().removal_policy(kind).to_string();
        debug!(kind = %kind, batch_len = batch.len(), policy = %policy, "collection window closed");
        self.route_batch(batch, &policy).await;
    }

    /// Identities buffered for a kind, not yet frozen
    pub fn buffered(&self, kind: ContainerKind) -> Vec<String> {
        let mut buffers = self
            .shared
            .buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        buffers.buffer_mut(kind).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freeze_dedups_in_order() {
        let batch = RemovalBatch::freeze(
            ContainerKind::Regular,
            vec!["b".to_string(), "a".to_string(), "b".to_string()],
        );
        assert_eq!(batch.identities, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_buffers_first_push_opens_window() {
        let mut buffers = RemovalBuffers::default();
        assert!(buffers.push(ContainerKind::Regular, "a".to_string()));
        assert!(!buffers.push(ContainerKind::Regular, "b".to_string()));
        assert!(buffers.push(ContainerKind::DeletesHistory, "c".to_string()));

        assert_eq!(buffers.take(ContainerKind::Regular).len(), 2);
        assert!(buffers.push(ContainerKind::Regular, "d".to_string()));
        assert!(!buffers.is_empty());
        buffers.take(ContainerKind::Regular);
        buffers.take(ContainerKind::DeletesHistory);
        assert!(buffers.is_empty());
    }
}

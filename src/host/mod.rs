//! Host capabilities consumed by the engine.
//!
//! The engine never creates or destroys anything itself. Identity and tab
//! management, history deletion and notifications are delegated to a
//! [`Host`] implementation.
//!
//! ```text
//! ┌──────────────────────────┐        ┌─────────────────────────┐
//! │        Lifecycle         │ ─────▶ │          Host           │
//! │ registry/tracker/queues  │        │ identities, tabs,       │
//! └──────────────────────────┘        │ history, notifications  │
//!                                     └─────────────────────────┘
//! ```

mod memory;

use std::future::Future;

use thiserror::Error;

use crate::container::{Color, Icon};

pub use memory::InMemoryHost;

/// Host-assigned tab identifier
pub type TabId = u64;

/// Error returned by a failed host call
#[derive(Debug, Clone, Error)]
#[error("{call} failed: {reason}")]
pub struct HostError {
    pub call: &'static str,
    pub reason: String,
}

impl HostError {
    pub fn new(call: &'static str, reason: impl Into<String>) -> Self {
        Self {
            call,
            reason: reason.into(),
        }
    }
}

/// A tab the engine opens a replacement next to
#[derive(Debug, Clone, Default)]
pub struct SourceTab {
    pub id: TabId,
    pub index: Option<u32>,
    pub active: bool,
    pub pinned: bool,
    pub opener_tab_id: Option<TabId>,
}

/// Where and how a new tab is placed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabPlacement {
    pub active: Option<bool>,
    pub index: Option<u32>,
    pub pinned: bool,
    pub opener_tab_id: Option<TabId>,
}

/// Identity, tab, history and notification primitives of the host.
pub trait Host: Send + Sync + 'static {
    /// Creates a new identity and returns its opaque id.
    fn create_identity(
        &self,
        name: &str,
        color: Color,
        icon: Icon,
    ) -> impl Future<Output = Result<String, HostError>> + Send;

    /// Destroys an identity.
    ///
    /// `Ok(false)` means the host did not know the identity (already gone).
    fn destroy_identity(&self, identity: &str)
        -> impl Future<Output = Result<bool, HostError>> + Send;

    fn create_tab(
        &self,
        identity: &str,
        url: Option<&str>,
        placement: TabPlacement,
    ) -> impl Future<Output = Result<TabId, HostError>> + Send;

    /// Live tabs inside an identity
    fn query_tabs(&self, identity: &str)
        -> impl Future<Output = Result<Vec<TabId>, HostError>> + Send;

    fn remove_tab(&self, tab_id: TabId) -> impl Future<Output = Result<(), HostError>> + Send;

    fn delete_history_entry(&self, url: &str)
        -> impl Future<Output = Result<(), HostError>> + Send;

    fn show_notification(&self, title: &str, message: &str) -> impl Future<Output = ()> + Send;

    /// True when no regular (non-private) tab is open.
    fn only_private_or_no_tabs(&self) -> impl Future<Output = Result<bool, HostError>> + Send;

    /// Whether the notification capability was granted
    fn notifications_permitted(&self) -> bool;

    /// Whether the history capability was granted
    fn history_permitted(&self) -> bool;
}

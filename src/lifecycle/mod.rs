//! Container lifecycle engine
//!
//! [`Lifecycle`] owns the registry, the tab tracker and the two removal
//! queues, and drives containers from creation to destruction:
//!
//! ```text
//! tab closed ──▶ collector ──(15s window)──▶ router ──┬──────────────▶ executor ──▶ host
//!                                                     └─▶ delay queue ─┘ (serial, 5s cooldown)
//! sweep (10min) ─────────────────────────────────────────────────────────▶ executor
//! ```
//!
//! A global "removal in progress" guard is raised when a collection window
//! opens and lowered once both queues hold no queued and no in-flight tasks.
//! Every path that raises it ends in [`Shared::removal_queue_maybe_done`].

mod collector;
mod create;
mod executor;
mod router;
mod sweep;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::Preferences;
use crate::container::{Container, Registry};
use crate::error::Result;
use crate::host::{Host, TabId};
use crate::queue::TaskQueue;
use crate::storage::{StateStore, Statistics, StoredState};
use crate::tracker::{DedupTable, TabTracker};

pub use collector::RemovalBatch;
pub use create::CreateTabRequest;
pub use executor::{RemovalOutcome, RunStatistics, SkipReason};

/// Title of every notification the engine shows
pub const NOTIFICATION_TITLE: &str = "Temporary Containers";

/// Registry, tracker and counters, mutated under one lock so a removal and
/// its tab cleanup are never observed half done
struct EngineState {
    registry: Registry,
    tabs: TabTracker,
    seen_requests: DedupTable<String, ()>,
    claimed_urls: DedupTable<String, String>,
    container_counter: u32,
    statistics: Statistics,
}

impl EngineState {
    fn stored(&self) -> StoredState {
        StoredState {
            containers: self.registry.records().clone(),
            container_counter: self.container_counter,
            statistics: self.statistics.clone(),
        }
    }
}

struct Shared<H: Host> {
    host: Arc<H>,
    store: Arc<dyn StateStore>,
    preferences: RwLock<Preferences>,
    state: Mutex<EngineState>,
    buffers: Mutex<collector::RemovalBuffers>,
    removal_in_progress: watch::Sender<bool>,
    removal_queue: TaskQueue,
    delay_queue: TaskQueue,
    last_run: Mutex<Option<RunStatistics>>,
}

impl<H: Host> Shared<H> {
    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lower the removal guard once both queues have fully drained and no
    /// collection window is open
    fn removal_queue_maybe_done(&self) {
        debug!(
            removal_size = self.removal_queue.size(),
            removal_pending = self.removal_queue.pending(),
            delay_size = self.delay_queue.size(),
            delay_pending = self.delay_queue.pending(),
            "checking whether removal queues are done"
        );
        let windows_open = !self
            .buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty();
        if windows_open {
            debug!("collection window still open");
            return;
        }
        if self.removal_queue.is_idle() && self.delay_queue.is_idle() {
            debug!("removal queues drained");
            self.removal_in_progress.send_replace(false);
        }
    }
}

/// Tracks ephemeral containers and removes them once no tab uses them
pub struct Lifecycle<H: Host> {
    shared: Arc<Shared<H>>,
}

impl<H: Host> Clone for Lifecycle<H> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<H: Host> Lifecycle<H> {
    /// Create the engine, restoring previously persisted state
    pub fn new(host: Arc<H>, preferences: Preferences, store: Arc<dyn StateStore>) -> Result<Self> {
        preferences.validate()?;
        let stored = store.load()?.unwrap_or_default();
        info!(
            containers = stored.containers.len(),
            counter = stored.container_counter,
            "restored container state"
        );

        let timings = preferences.timings.clone();
        let state = EngineState {
            registry: Registry::from_records(stored.containers),
            tabs: TabTracker::new(),
            seen_requests: DedupTable::new(timings.request_dedup_ttl()),
            claimed_urls: DedupTable::new(timings.url_dedup_ttl()),
            container_counter: stored.container_counter,
            statistics: stored.statistics,
        };

        let (removal_in_progress, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            host,
            store,
            preferences: RwLock::new(preferences),
            state: Mutex::new(state),
            buffers: Mutex::new(collector::RemovalBuffers::default()),
            removal_in_progress,
            removal_queue: TaskQueue::serial("removal"),
            delay_queue: TaskQueue::unbounded("removal-delay"),
            last_run: Mutex::new(None),
        });

        for queue in [&shared.removal_queue, &shared.delay_queue] {
            let weak = Arc::downgrade(&shared);
            queue.set_on_settled(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.removal_queue_maybe_done();
                }
            });
        }

        Ok(Self { shared })
    }

    pub fn host(&self) -> &Arc<H> {
        &self.shared.host
    }

    pub fn preferences(&self) -> Preferences {
        self.shared
            .preferences
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace preferences. Timings of the dedup tables are kept.
    pub fn set_preferences(&self, preferences: Preferences) -> Result<()> {
        preferences.validate()?;
        *self
            .shared
            .preferences
            .write()
            .unwrap_or_else(PoisonError::into_inner) = preferences;
        Ok(())
    }

    /// True from the moment a collection window opens until both removal
    /// queues are drained
    pub fn removal_in_progress(&self) -> bool {
        *self.shared.removal_in_progress.borrow()
    }

    fn set_removal_in_progress(&self) {
        if !self.shared.removal_in_progress.send_replace(true) {
            debug!("removal in progress");
        }
    }

    /// Wait until the removal guard is lowered
    pub async fn wait_until_idle(&self) {
        let mut rx = self.shared.removal_in_progress.subscribe();
        let _ = rx.wait_for(|in_progress| !*in_progress).await;
    }

    /// Hand the current state to the store. Failures are logged only.
    fn persist(&self) {
        let state = self.shared.state();
        if let Err(e) = self.shared.store.persist(&state.stored()) {
            warn!(error = %e, "failed to persist container state");
        }
    }

    pub fn associate_tab(&self, tab_id: TabId, identity: &str) {
        self.shared.state().tabs.associate(tab_id, identity);
    }

    pub fn dissociate_tab(&self, tab_id: TabId) {
        self.shared.state().tabs.dissociate(tab_id);
    }

    /// Container a tracked tab belongs to
    pub fn container_of_tab(&self, tab_id: TabId) -> Option<String> {
        self.shared.state().tabs.container_of(tab_id).map(str::to_string)
    }

    /// Mark the container owning a tab as no longer clean
    pub fn mark_unclean(&self, tab_id: TabId) {
        let changed = {
            let mut state = self.shared.state();
            match state.tabs.container_of(tab_id).map(str::to_string) {
                Some(identity) => {
                    let changed = state.registry.mark_unclean(&identity);
                    if changed {
                        debug!(identity = %identity, tab_id, "container is not clean anymore");
                    }
                    changed
                }
                None => false,
            }
        };
        if changed {
            self.persist();
        }
    }

    /// Log a URL visited in a history-erasing container
    pub fn record_history_visit(&self, identity: &str, url: &str, tab_id: TabId) {
        let changed = self
            .shared
            .state()
            .registry
            .record_history_visit(identity, url, tab_id);
        if changed {
            self.persist();
        }
    }

    /// Update the advisory cookie count of a container
    pub fn set_cookie_count(&self, identity: &str, cookie_count: u64) {
        let changed = match self.shared.state().registry.get_mut(identity) {
            Some(container) => {
                container.cookie_count = cookie_count;
                true
            }
            None => false,
        };
        if changed {
            self.persist();
        }
    }

    /// Identities that are neither the default context nor managed here
    pub fn is_permanent(&self, identity: &str) -> bool {
        self.shared.state().registry.is_permanent(identity)
    }

    /// Returns true if a container was already created for this request
    pub fn mark_request_seen(&self, request_id: &str) -> bool {
        self.shared
            .state()
            .seen_requests
            .mark_seen(request_id.to_string())
    }

    /// Remember which container was just created for a URL
    pub fn claim_url(&self, url: &str, identity: &str) {
        self.shared
            .state()
            .claimed_urls
            .insert(url.to_string(), identity.to_string());
    }

    /// Container recently created for a URL, if still within its TTL
    pub fn url_claim(&self, url: &str) -> Option<String> {
        self.shared
            .state()
            .claimed_urls
            .get(&url.to_string())
            .cloned()
    }

    pub fn container(&self, identity: &str) -> Option<Container> {
        self.shared.state().registry.get(identity).cloned()
    }

    pub fn is_registered(&self, identity: &str) -> bool {
        self.shared.state().registry.exists(identity)
    }

    /// All registered identities, in ascending order
    pub fn identities(&self) -> Vec<String> {
        self.shared.state().registry.identities()
    }

    pub fn statistics(&self) -> Statistics {
        self.shared.state().statistics.clone()
    }

    /// Statistics of the last removal run that removed anything
    pub fn last_run(&self) -> Option<RunStatistics> {
        self.shared
            .last_run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.shared.state();
        let mut snapshot = Snapshot::from_stored(&state.stored());
        for summary in &mut snapshot.containers {
            summary.tabs = state.tabs.tabs_of(&summary.identity).len();
        }
        snapshot.removal_in_progress = self.removal_in_progress();
        snapshot.last_run = self.last_run();
        snapshot
    }

    /// Show a notification if the user wants them and the host allows it
    async fn maybe_show_notification(&self, message: &str) {
        let enabled = self.preferences().notifications;
        if enabled && self.shared.host.notifications_permitted() {
            debug!(message, "showing notification");
            self.shared
                .host
                .show_notification(NOTIFICATION_TITLE, message)
                .await;
        }
    }
}

/// Per-container line of a [`Snapshot`]
#[derive(Debug, Clone, Serialize)]
pub struct ContainerSummary {
    pub identity: String,
    pub name: String,
    pub number: u32,
    pub color: String,
    pub icon: String,
    pub deletes_history: bool,
    pub clean: bool,
    pub history_entries: usize,
    pub cookie_count: u64,
    /// Tracked tabs, zero when built from persisted state
    pub tabs: usize,
}

/// Point-in-time view of the engine for display
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub containers: Vec<ContainerSummary>,
    pub statistics: Statistics,
    pub removal_in_progress: bool,
    pub last_run: Option<RunStatistics>,
}

impl Snapshot {
    pub fn from_stored(state: &StoredState) -> Self {
        let containers = state
            .containers
            .iter()
            .map(|(identity, container)| ContainerSummary {
                identity: identity.clone(),
                name: container.name.clone(),
                number: container.number,
                color: container.color.to_string(),
                icon: container.icon.to_string(),
                deletes_history: container.deletes_history,
                clean: container.clean,
                history_entries: container.history.len(),
                cookie_count: container.cookie_count,
                tabs: 0,
            })
            .collect();
        Self {
            containers,
            statistics: state.statistics.clone(),
            removal_in_progress: false,
            last_run: None,
        }
    }
}

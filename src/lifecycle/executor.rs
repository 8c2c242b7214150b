//! Serial removal executor
//!
//! Runs on the concurrency-1 removal queue. Each identity is checked for live
//! tabs, destroyed on the host, purged from history when it erases history,
//! and dropped from the registry and tracker in one step. A cooldown follows
//! every destruction so identity churn never races on the host.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::Lifecycle;
use crate::config::Preferences;
use crate::container::Container;
use crate::host::Host;
use crate::storage::Statistics;

/// Counters for one executor task, reported once in a notification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    pub containers_removed: u64,
    pub cookies_removed: u64,
    pub history_entries_removed: u64,
}

impl RunStatistics {
    pub fn record(&mut self, cookies: u64, history_entries: u64) {
        self.containers_removed += 1;
        self.cookies_removed += cookies;
        self.history_entries_removed += history_entries;
    }

    pub fn is_empty(&self) -> bool {
        self.containers_removed == 0
    }

    pub fn notification_message(&self) -> String {
        let mut message = format!("Deleted Temporary Containers: {}", self.containers_removed);
        if self.cookies_removed > 0 {
            message.push_str(&format!("\nand {} Cookies with them", self.cookies_removed));
        }
        if self.history_entries_removed > 0 {
            message.push_str(&format!(
                "\nand {} URLs from History with them",
                self.history_entries_removed
            ));
        }
        message
    }
}

/// Why an identity was left in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No longer registered
    Unknown,
    /// Still has live tabs
    InUse(usize),
    /// Only private tabs or none are open on the host
    HostIdle,
    /// A host call failed; a later trigger or the sweep retries
    HostCallFailed,
}

/// Result of a single removal attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed { cookies: u64, history_entries: u64 },
    Skipped(SkipReason),
}

impl RemovalOutcome {
    pub fn is_removed(&self) -> bool {
        matches!(self, RemovalOutcome::Removed { .. })
    }
}

impl<H: Host> Lifecycle<H> {
    /// Try to remove every identity in order, pausing after each removal
    pub(crate) async fn try_to_remove_queue(&self, identities: Vec<String>) -> RunStatistics {
        debug!(batch_len = identities.len(), "processing removal queue");
        let cooldown = self.preferences().timings.removal_cooldown();
        let mut run = RunStatistics::default();

        for identity in identities {
            if !self.is_registered(&identity) {
                debug!(identity = %identity, "unknown container, probably already removed");
                continue;
            }
            if let RemovalOutcome::Removed {
                cookies,
                history_entries,
            } = self.try_remove(&identity).await
            {
                run.record(cookies, history_entries);
                debug!(identity = %identity, "container removed, cooling down");
                tokio::time::sleep(cooldown).await;
            }
        }

        if run.is_empty() {
            debug!("no containers removed");
            return run;
        }

        info!(
            containers = run.containers_removed,
            cookies = run.cookies_removed,
            history_entries = run.history_entries_removed,
            "removal run finished"
        );
        self.maybe_show_notification(&run.notification_message()).await;
        *self
            .shared
            .last_run
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(run.clone());
        run
    }

    /// Destroy a container if nothing uses it anymore.
    ///
    /// The registry entry is only dropped after the host confirmed destruction.
    pub async fn try_remove(&self, identity: &str) -> RemovalOutcome {
        if !self.is_registered(identity) {
            debug!(identity, "container is not managed here, not removing");
            return RemovalOutcome::Skipped(SkipReason::Unknown);
        }
        let host = &self.shared.host;

        match host.only_private_or_no_tabs().await {
            Ok(true) => {
                debug!(identity, "only private tabs or no tabs open, not removing");
                return RemovalOutcome::Skipped(SkipReason::HostIdle);
            }
            Ok(false) => {}
            Err(e) => {
                warn!(identity, error = %e, "failed to check host tab state");
                return RemovalOutcome::Skipped(SkipReason::HostCallFailed);
            }
        }

        match host.query_tabs(identity).await {
            Ok(tabs) if !tabs.is_empty() => {
                debug!(identity, tabs = tabs.len(), "container still has tabs");
                return RemovalOutcome::Skipped(SkipReason::InUse(tabs.len()));
            }
            Ok(_) => {}
            Err(e) => {
                warn!(identity, error = %e, "failed to query tabs");
                return RemovalOutcome::Skipped(SkipReason::HostCallFailed);
            }
        }

        match host.destroy_identity(identity).await {
            Ok(true) => debug!(identity, "container destroyed"),
            Ok(false) => debug!(identity, "host did not know container, probably already removed"),
            Err(e) => {
                warn!(identity, error = %e, "failed to destroy container");
                return RemovalOutcome::Skipped(SkipReason::HostCallFailed);
            }
        }

        let removed = {
            let mut state = self.shared.state();
            let dropped_tabs = state.tabs.forget_container(identity);
            let removed = state.registry.remove(identity);
            if removed.is_some() {
                debug!(identity, dropped_tabs, "dropped container from registry");
            }
            removed
        };
        let Some(container) = removed else {
            return RemovalOutcome::Skipped(SkipReason::Unknown);
        };

        let history_entries = self.clear_history(identity, &container).await;
        {
            let preferences = self.preferences();
            let mut state = self.shared.state();
            update_statistics(&mut state.statistics, &preferences, &container, history_entries);
        }
        self.persist();

        RemovalOutcome::Removed {
            cookies: container.cookie_count,
            history_entries,
        }
    }

    /// Delete logged URLs from history, returning how many were logged
    async fn clear_history(&self, identity: &str, container: &Container) -> u64 {
        if !container.deletes_history {
            return 0;
        }
        let mut count = 0;
        for url in container.history.keys().filter(|url| !url.is_empty()) {
            debug!(identity, url = %url, "removing url from history");
            if let Err(e) = self.shared.host.delete_history_entry(url).await {
                warn!(identity, url = %url, error = %e, "failed to delete history entry");
            }
            count += 1;
        }
        count
    }
}

fn update_statistics(
    statistics: &mut Statistics,
    preferences: &Preferences,
    container: &Container,
    history_entries: u64,
) {
    if preferences.statistics {
        statistics.containers_deleted += 1;
        statistics.cookies_deleted += container.cookie_count;
    }
    if preferences.deletes_history.statistics && container.deletes_history {
        let deletes_history = &mut statistics.deletes_history;
        deletes_history.containers_deleted += 1;
        deletes_history.cookies_deleted += container.cookie_count;
        deletes_history.urls_deleted += history_entries;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Color, Icon};

    #[test]
    fn test_notification_message_containers_only() {
        let mut run = RunStatistics::default();
        run.record(0, 0);
        assert_eq!(run.notification_message(), "Deleted Temporary Containers: 1");
    }

    #[test]
    fn test_notification_message_with_cookies_and_history() {
        let mut run = RunStatistics::default();
        run.record(3, 2);
        run.record(1, 0);
        assert_eq!(
            run.notification_message(),
            "Deleted Temporary Containers: 2\nand 4 Cookies with them\nand 2 URLs from History with them"
        );
    }

    #[test]
    fn test_update_statistics_respects_toggles() {
        let mut container = Container::new("tmp1".to_string(), 1, Color::Blue, Icon::Circle, true);
        container.cookie_count = 5;

        let mut statistics = Statistics::default();
        update_statistics(&mut statistics, &Preferences::default(), &container, 2);
        assert_eq!(statistics, Statistics::default());

        let mut preferences = Preferences::default();
        preferences.statistics = true;
        preferences.deletes_history.statistics = true;
        update_statistics(&mut statistics, &preferences, &container, 2);
        assert_eq!(statistics.containers_deleted, 1);
        assert_eq!(statistics.cookies_deleted, 5);
        assert_eq!(statistics.deletes_history.containers_deleted, 1);
        assert_eq!(statistics.deletes_history.cookies_deleted, 5);
        assert_eq!(statistics.deletes_history.urls_deleted, 2);
    }
}

//! Periodic reconciliation sweep
//!
//! Resubmits every registered container to the removal executor. This is
//! what eventually removes containers whose trigger was missed or whose
//! earlier attempt was skipped because tabs were still open.

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::Lifecycle;
use crate::host::Host;

impl<H: Host> Lifecycle<H> {
    /// Submit the whole registry for removal.
    ///
    /// Skipped while a batch cycle is running, except at startup when nothing
    /// can be in flight yet. Returns true if a task was submitted.
    pub async fn sweep(&self, startup: bool) -> bool {
        if self.removal_in_progress() && !startup {
            debug!("skipping sweep, removal already in progress");
            return false;
        }
        let identities = self.identities();
        if identities.is_empty() {
            debug!("skipping sweep, no containers");
            return false;
        }
        match self.shared.host.only_private_or_no_tabs().await {
            Ok(false) => {}
            Ok(true) => {
                debug!("skipping sweep, only private tabs or no tabs open");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "skipping sweep, failed to check host tab state");
                return false;
            }
        }

        debug!(containers = identities.len(), "sweeping containers");
        self.set_removal_in_progress();
        self.submit_removal(identities);
        true
    }

    /// Run a startup sweep, then sweep on a fixed interval until aborted
    pub fn start(&self) -> JoinHandle<()> {
        let lifecycle = self.clone();
        let period = self.preferences().timings.sweep_interval();
        tokio::spawn(async move {
            lifecycle.sweep(true).await;
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                debug!("sweep interval elapsed");
                lifecycle.sweep(false).await;
            }
        })
    }
}

//! Removal policy routing

use tracing::{debug, warn};

use super::{Lifecycle, RemovalBatch};
use crate::config::RemovalPolicy;
use crate::host::Host;

impl<H: Host> Lifecycle<H> {
    /// Apply the configured policy to a frozen batch
    pub(crate) async fn route_batch(&self, batch: RemovalBatch, policy: &str) {
        match policy.parse::<RemovalPolicy>() {
            Ok(RemovalPolicy::Instant) => {
                debug!(kind = %batch.kind, batch_len = batch.len(), "removing batch now");
                self.submit_removal(batch.identities);
            }
            Ok(policy @ RemovalPolicy::Delay(_)) => {
                self.delay_removal(batch, policy).await;
            }
            Err(e) => {
                warn!(kind = %batch.kind, error = %e, "dropping removal batch");
                self.shared.removal_queue_maybe_done();
            }
        }
    }

    /// Queue identities on the serial removal executor
    pub(crate) fn submit_removal(&self, identities: Vec<String>) {
        let lifecycle = self.clone();
        self.shared.removal_queue.add(async move {
            lifecycle.try_to_remove_queue(identities).await;
        });
    }

    async fn delay_removal(&self, batch: RemovalBatch, policy: RemovalPolicy) {
        let Some(delay) = policy.delay() else {
            self.submit_removal(batch.identities);
            return;
        };
        debug!(
            kind = %batch.kind,
            batch_len = batch.len(),
            delay_secs = delay.as_secs(),
            "delaying batch removal"
        );
        let count = batch.len();
        let lifecycle = self.clone();
        self.shared.delay_queue.add_after(delay, async move {
            debug!(kind = %batch.kind, batch_len = batch.len(), "delay elapsed, removing batch");
            lifecycle.submit_removal(batch.identities);
        });

        self.maybe_show_notification(&format!(
            "Queued {} Temporary Containers for removal in {}",
            count, policy
        ))
        .await;
    }
}

//! Scripted scenarios replayed against the in-memory host
//!
//! A scenario is a JSON list of steps. Tabs are referred to by aliases chosen
//! in the `open`/`open_in` steps:
//!
//! ```json
//! { "steps": [
//!     { "op": "open", "tab": "a", "url": "https://a.example" },
//!     { "op": "open_in", "tab": "a2", "with": "a" },
//!     { "op": "visit", "tab": "a", "url": "https://a.example/page" },
//!     { "op": "close", "tab": "a" },
//!     { "op": "close", "tab": "a2" },
//!     { "op": "wait", "ms": 100 }
//! ] }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{EphemeraError, Result};
use crate::host::{Host, InMemoryHost, TabId, TabPlacement};
use crate::lifecycle::{CreateTabRequest, Lifecycle};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Open a tab in a new container
    Open {
        tab: String,
        url: Option<String>,
        #[serde(default)]
        deletes_history: bool,
        request_id: Option<String>,
    },
    /// Open another tab in the container of an existing one
    OpenIn {
        tab: String,
        with: String,
        url: Option<String>,
    },
    /// Navigate a tab, logging history for history-erasing containers
    Visit { tab: String, url: String },
    /// Network activity in a tab
    Request { tab: String },
    /// Set the cookie count of the container a tab lives in
    Cookies { tab: String, count: u64 },
    /// Close a tab
    Close { tab: String },
    Wait { ms: u64 },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| EphemeraError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Replays scenario steps and tracks tab aliases
pub struct ScenarioRunner<'a> {
    lifecycle: &'a Lifecycle<InMemoryHost>,
    tabs: HashMap<String, TabId>,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(lifecycle: &'a Lifecycle<InMemoryHost>) -> Self {
        Self {
            lifecycle,
            tabs: HashMap::new(),
        }
    }

    fn tab(&self, alias: &str) -> Result<TabId> {
        self.tabs
            .get(alias)
            .copied()
            .ok_or_else(|| EphemeraError::Config(format!("unknown tab alias '{}'", alias)))
    }

    fn identity_of(&self, alias: &str) -> Result<String> {
        let tab = self.tab(alias)?;
        self.lifecycle
            .container_of_tab(tab)
            .ok_or_else(|| EphemeraError::UnknownIdentity(format!("tab '{}' has no container", alias)))
    }

    /// Run every step, then wait until all removals have drained
    pub async fn run(&mut self, scenario: &Scenario) -> Result<()> {
        for (index, step) in scenario.steps.iter().enumerate() {
            debug!(step = index, ?step, "running scenario step");
            self.step(step).await?;
        }
        info!("scenario finished, waiting for removals to drain");
        self.lifecycle.wait_until_idle().await;
        Ok(())
    }

    async fn step(&mut self, step: &Step) -> Result<()> {
        let host = self.lifecycle.host();
        match step {
            Step::Open {
                tab,
                url,
                deletes_history,
                request_id,
            } => {
                let request = CreateTabRequest {
                    url: url.clone(),
                    request_id: request_id.clone(),
                    deletes_history: *deletes_history,
                    ..CreateTabRequest::default()
                };
                if let Some(tab_id) = self.lifecycle.create_tab_in_container(request).await? {
                    self.tabs.insert(tab.clone(), tab_id);
                }
            }
            Step::OpenIn { tab, with, url } => {
                let identity = self.identity_of(with)?;
                let tab_id = host
                    .create_tab(&identity, url.as_deref(), TabPlacement::default())
                    .await?;
                self.lifecycle.associate_tab(tab_id, &identity);
                self.tabs.insert(tab.clone(), tab_id);
            }
            Step::Visit { tab, url } => {
                let tab_id = self.tab(tab)?;
                let identity = self.identity_of(tab)?;
                self.lifecycle.record_history_visit(&identity, url, tab_id);
            }
            Step::Request { tab } => {
                self.lifecycle.mark_unclean(self.tab(tab)?);
            }
            Step::Cookies { tab, count } => {
                let identity = self.identity_of(tab)?;
                self.lifecycle.set_cookie_count(&identity, *count);
            }
            Step::Close { tab } => {
                let tab_id = self.tab(tab)?;
                host.close_tab(tab_id);
                self.lifecycle.enqueue_for_removal(tab_id);
                self.lifecycle.dissociate_tab(tab_id);
            }
            Step::Wait { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
        }
        Ok(())
    }
}

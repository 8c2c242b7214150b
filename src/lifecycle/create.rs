//! Container creation

use tracing::{debug, info, warn};

use super::Lifecycle;
use crate::config::NumberMode;
use crate::container::allocator::{next_number, pick_color, pick_icon};
use crate::container::Container;
use crate::error::Result;
use crate::host::{Host, SourceTab, TabId, TabPlacement};

/// Suffix appended to the name of history-erasing containers
const DELETES_HISTORY_SUFFIX: &str = "-deletes-history";

/// Options for opening a tab in a fresh container
#[derive(Debug, Clone)]
pub struct CreateTabRequest {
    /// Tab the new one is opened next to
    pub source_tab: Option<SourceTab>,
    pub url: Option<String>,
    /// `Some(false)` forces a background tab
    pub active: Option<bool>,
    /// Network request that triggered the creation, for redirect dedup
    pub request_id: Option<String>,
    /// Never carry over the pinned state of the source tab
    pub dont_pin: bool,
    pub deletes_history: bool,
}

impl Default for CreateTabRequest {
    fn default() -> Self {
        Self {
            source_tab: None,
            url: None,
            active: None,
            request_id: None,
            dont_pin: true,
            deletes_history: false,
        }
    }
}

impl CreateTabRequest {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    fn placement(&self) -> TabPlacement {
        let mut placement = TabPlacement::default();
        if let Some(tab) = &self.source_tab {
            placement.active = Some(tab.active);
            placement.index = tab.index.map(|index| index + 1);
            placement.pinned = tab.pinned && !self.dont_pin;
            placement.opener_tab_id = tab.opener_tab_id;
        }
        if self.active == Some(false) {
            placement.active = Some(false);
        }
        placement
    }
}

impl<H: Host> Lifecycle<H> {
    /// Create a container and open a tab in it.
    ///
    /// Returns `Ok(None)` when the request was already handled (redirects) or
    /// a host call failed. Only a registry invariant violation is an error.
    pub async fn create_tab_in_container(&self, request: CreateTabRequest) -> Result<Option<TabId>> {
        if let Some(request_id) = &request.request_id {
            if self.mark_request_seen(request_id) {
                debug!(request_id = %request_id, "container already created for this request");
                return Ok(None);
            }
        }

        let preferences = self.preferences();
        let number = {
            let mut state = self.shared.state();
            let number = next_number(
                preferences.container.number_mode,
                state.container_counter,
                &state.registry.numbers(),
            );
            if preferences.container.number_mode == NumberMode::Keep {
                state.container_counter = number;
            }
            number
        };

        let mut name = format!("{}{}", preferences.container.name_prefix, number);
        let mut deletes_history = request.deletes_history;
        if deletes_history {
            if self.shared.host.history_permitted() {
                name.push_str(DELETES_HISTORY_SUFFIX);
            } else {
                debug!("history capability missing, creating regular container");
                deletes_history = false;
            }
        }

        let (color, icon) = {
            let colors = self.shared.state().registry.colors();
            let mut rng = rand::rng();
            let color = pick_color(
                &mut rng,
                preferences.container.color_random,
                preferences.container.color,
                &colors,
            );
            let icon = pick_icon(
                &mut rng,
                preferences.container.icon_random,
                preferences.container.icon,
            );
            (color, icon)
        };

        debug!(name = %name, %color, %icon, "creating container");
        let identity = match self.shared.host.create_identity(&name, color, icon).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(name = %name, error = %e, "failed to create container");
                return Ok(None);
            }
        };

        {
            let container = Container::new(name, number, color, icon, deletes_history);
            self.shared.state().registry.register(&identity, container)?;
        }
        self.persist();

        let placement = request.placement();
        debug!(identity = %identity, ?placement, "creating tab in container");
        let tab_id = match self
            .shared
            .host
            .create_tab(&identity, request.url.as_deref(), placement)
            .await
        {
            Ok(tab_id) => tab_id,
            Err(e) => {
                warn!(identity = %identity, error = %e, "failed to create tab in container");
                return Ok(None);
            }
        };

        if let Some(url) = &request.url {
            self.claim_url(url, &identity);
        }
        self.associate_tab(tab_id, &identity);
        self.persist();

        info!(identity = %identity, tab_id, number, deletes_history, "opened tab in new container");
        Ok(Some(tab_id))
    }

    /// Open the request in a new container, then close the source tab
    pub async fn reload_tab_in_container(&self, request: CreateTabRequest) -> Result<Option<TabId>> {
        let source = request.source_tab.as_ref().map(|tab| tab.id);
        let new_tab = self.create_tab_in_container(request).await?;
        if let Some(source) = source {
            if let Err(e) = self.shared.host.remove_tab(source).await {
                warn!(tab_id = source, error = %e, "failed to remove source tab");
            }
        }
        Ok(new_tab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_without_source_tab() {
        let request = CreateTabRequest::for_url("https://a.example");
        assert_eq!(request.placement(), TabPlacement::default());
    }

    #[test]
    fn test_placement_follows_source_tab() {
        let request = CreateTabRequest {
            source_tab: Some(SourceTab {
                id: 4,
                index: Some(2),
                active: true,
                pinned: true,
                opener_tab_id: Some(1),
            }),
            ..CreateTabRequest::default()
        };
        assert_eq!(
            request.placement(),
            TabPlacement {
                active: Some(true),
                index: Some(3),
                pinned: false,
                opener_tab_id: Some(1),
            }
        );
    }

    #[test]
    fn test_placement_pins_and_backgrounds() {
        let request = CreateTabRequest {
            source_tab: Some(SourceTab {
                id: 4,
                index: None,
                active: true,
                pinned: true,
                opener_tab_id: None,
            }),
            active: Some(false),
            dont_pin: false,
            ..CreateTabRequest::default()
        };
        let placement = request.placement();
        assert!(placement.pinned);
        assert_eq!(placement.active, Some(false));
    }
}

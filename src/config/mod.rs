//! Preferences consumed by the lifecycle engine
//!
//! Preferences are read from a JSON file. Removal policies are kept as raw
//! strings here and parsed into [`RemovalPolicy`] when a batch is routed, so a
//! bad value only aborts the batch that hits it.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::container::{Color, ContainerKind, Icon};
use crate::error::{EphemeraError, Result};

/// How container numbers are assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberMode {
    /// Strictly increasing counter, numbers are never handed out twice
    Keep,
    /// Smallest number not currently in use
    Reuse,
}

/// What happens to a frozen removal batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPolicy {
    Instant,
    /// Wait this many minutes before removal
    Delay(u64),
}

impl RemovalPolicy {
    /// Delay before the batch reaches the removal executor
    pub fn delay(&self) -> Option<Duration> {
        match self {
            RemovalPolicy::Instant => None,
            RemovalPolicy::Delay(minutes) => Some(Duration::from_secs(minutes * 60)),
        }
    }
}

impl FromStr for RemovalPolicy {
    type Err = EphemeraError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "instant" => Ok(RemovalPolicy::Instant),
            "2minutes" => Ok(RemovalPolicy::Delay(2)),
            "5minutes" => Ok(RemovalPolicy::Delay(5)),
            "15minutes" => Ok(RemovalPolicy::Delay(15)),
            other => Err(EphemeraError::UnrecognizedPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalPolicy::Instant => write!(f, "instant"),
            RemovalPolicy::Delay(minutes) => write!(f, "{}minutes", minutes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerPreferences {
    pub number_mode: NumberMode,
    pub name_prefix: String,
    pub color: Color,
    pub color_random: bool,
    pub icon: Icon,
    pub icon_random: bool,
    /// Removal policy for regular containers
    pub removal: String,
}

impl Default for ContainerPreferences {
    fn default() -> Self {
        Self {
            number_mode: NumberMode::Keep,
            name_prefix: "tmp".to_string(),
            color: Color::Red,
            color_random: false,
            icon: Icon::Circle,
            icon_random: false,
            removal: "15minutes".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletesHistoryPreferences {
    /// Removal policy for history-erasing containers
    pub container_removal: String,
    pub statistics: bool,
}

impl Default for DeletesHistoryPreferences {
    fn default() -> Self {
        Self {
            container_removal: "15minutes".to_string(),
            statistics: false,
        }
    }
}

/// Fixed durations used by the engine, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub batch_window_ms: u64,
    pub removal_cooldown_ms: u64,
    pub sweep_interval_ms: u64,
    pub request_dedup_ttl_ms: u64,
    pub url_dedup_ttl_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            batch_window_ms: 15_000,
            removal_cooldown_ms: 5_000,
            sweep_interval_ms: 600_000,
            request_dedup_ttl_ms: 2_000,
            url_dedup_ttl_ms: 1_000,
        }
    }
}

impl Timings {
    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }

    pub fn removal_cooldown(&self) -> Duration {
        Duration::from_millis(self.removal_cooldown_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn request_dedup_ttl(&self) -> Duration {
        Duration::from_millis(self.request_dedup_ttl_ms)
    }

    pub fn url_dedup_ttl(&self) -> Duration {
        Duration::from_millis(self.url_dedup_ttl_ms)
    }
}

/// User preferences relevant to container lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub container: ContainerPreferences,
    pub deletes_history: DeletesHistoryPreferences,
    pub notifications: bool,
    pub statistics: bool,
    pub timings: Timings,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            container: ContainerPreferences::default(),
            deletes_history: DeletesHistoryPreferences::default(),
            notifications: false,
            statistics: false,
            timings: Timings::default(),
        }
    }
}

impl Preferences {
    /// Load preferences from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let prefs: Preferences = serde_json::from_str(&content)
            .map_err(|e| EphemeraError::Config(format!("{}: {}", path.display(), e)))?;
        prefs.validate()?;
        Ok(prefs)
    }

    /// Reject preferences the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.timings.sweep_interval_ms == 0 {
            return Err(EphemeraError::Config(
                "timings.sweep_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Raw removal policy configured for a container kind
    pub fn removal_policy(&self, kind: ContainerKind) -> &str {
        match kind {
            ContainerKind::Regular => &self.container.removal,
            ContainerKind::DeletesHistory => &self.deletes_history.container_removal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!("instant".parse::<RemovalPolicy>().unwrap(), RemovalPolicy::Instant);
        assert_eq!("2minutes".parse::<RemovalPolicy>().unwrap(), RemovalPolicy::Delay(2));
        assert_eq!("5minutes".parse::<RemovalPolicy>().unwrap(), RemovalPolicy::Delay(5));
        assert_eq!("15minutes".parse::<RemovalPolicy>().unwrap(), RemovalPolicy::Delay(15));
    }

    #[test]
    fn test_policy_unrecognized() {
        let err = "3minutes".parse::<RemovalPolicy>().unwrap_err();
        assert!(matches!(err, EphemeraError::UnrecognizedPolicy(ref p) if p == "3minutes"));
    }

    #[test]
    fn test_policy_delay_and_display() {
        assert_eq!(RemovalPolicy::Instant.delay(), None);
        assert_eq!(RemovalPolicy::Delay(2).delay(), Some(Duration::from_secs(120)));
        assert_eq!(RemovalPolicy::Delay(15).to_string(), "15minutes");
    }

    #[test]
    fn test_removal_policy_by_kind() {
        let mut prefs = Preferences::default();
        prefs.container.removal = "instant".to_string();
        prefs.deletes_history.container_removal = "2minutes".to_string();
        assert_eq!(prefs.removal_policy(ContainerKind::Regular), "instant");
        assert_eq!(prefs.removal_policy(ContainerKind::DeletesHistory), "2minutes");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"container": {"number_mode": "reuse"}, "notifications": true}"#)
                .unwrap();
        assert_eq!(prefs.container.number_mode, NumberMode::Reuse);
        assert_eq!(prefs.container.name_prefix, "tmp");
        assert!(prefs.notifications);
        assert_eq!(prefs.timings.batch_window(), Duration::from_secs(15));
    }

    #[test]
    fn test_load_rejects_zero_sweep_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"timings": {"sweep_interval_ms": 0}}"#).unwrap();
        assert!(matches!(Preferences::load(&path), Err(EphemeraError::Config(_))));
    }
}

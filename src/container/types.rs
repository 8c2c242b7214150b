//! Container record definition
//!
//! A Container is one isolated context tracked by the engine. Its number,
//! color and icon are fixed at creation; only the clean flag, the history log
//! and the cookie count change afterwards.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::host::TabId;

/// Container colors offered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Turquoise,
    Green,
    Yellow,
    Orange,
    Red,
    Pink,
    Purple,
}

impl Color {
    pub const ALL: [Color; 8] = [
        Color::Blue,
        Color::Turquoise,
        Color::Green,
        Color::Yellow,
        Color::Orange,
        Color::Red,
        Color::Pink,
        Color::Purple,
    ];
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Blue => "blue",
            Color::Turquoise => "turquoise",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Orange => "orange",
            Color::Red => "red",
            Color::Pink => "pink",
            Color::Purple => "purple",
        };
        f.write_str(name)
    }
}

/// Container icons offered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    Fingerprint,
    Briefcase,
    Dollar,
    Cart,
    Circle,
    Gift,
    Vacation,
    Food,
    Fruit,
    Pet,
    Tree,
    Chill,
}

impl Icon {
    pub const ALL: [Icon; 12] = [
        Icon::Fingerprint,
        Icon::Briefcase,
        Icon::Dollar,
        Icon::Cart,
        Icon::Circle,
        Icon::Gift,
        Icon::Vacation,
        Icon::Food,
        Icon::Fruit,
        Icon::Pet,
        Icon::Tree,
        Icon::Chill,
    ];
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Icon::Fingerprint => "fingerprint",
            Icon::Briefcase => "briefcase",
            Icon::Dollar => "dollar",
            Icon::Cart => "cart",
            Icon::Circle => "circle",
            Icon::Gift => "gift",
            Icon::Vacation => "vacation",
            Icon::Food => "food",
            Icon::Fruit => "fruit",
            Icon::Pet => "pet",
            Icon::Tree => "tree",
            Icon::Chill => "chill",
        };
        f.write_str(name)
    }
}

/// Which removal path a container takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Regular,
    DeletesHistory,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Regular => write!(f, "regular"),
            ContainerKind::DeletesHistory => write!(f, "deletesHistory"),
        }
    }
}

/// A tracked ephemeral container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Display name, `<prefix><number>` plus an optional suffix
    pub name: String,
    pub number: u32,
    pub color: Color,
    pub icon: Icon,
    /// Visited URLs are purged from history when the container goes away
    pub deletes_history: bool,
    /// No network activity observed yet
    pub clean: bool,
    /// URL -> tab that visited it, only kept for history-erasing containers
    #[serde(default)]
    pub history: BTreeMap<String, TabId>,
    #[serde(default)]
    pub cookie_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Container {
    /// Create a new, clean container record
    pub fn new(name: String, number: u32, color: Color, icon: Icon, deletes_history: bool) -> Self {
        Self {
            name,
            number,
            color,
            icon,
            deletes_history,
            clean: true,
            history: BTreeMap::new(),
            cookie_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        if self.deletes_history {
            ContainerKind::DeletesHistory
        } else {
            ContainerKind::Regular
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_new() {
        let container = Container::new("tmp1".to_string(), 1, Color::Blue, Icon::Circle, false);
        assert_eq!(container.name, "tmp1");
        assert!(container.clean);
        assert!(container.history.is_empty());
        assert_eq!(container.kind(), ContainerKind::Regular);
    }

    #[test]
    fn test_container_kind_deletes_history() {
        let container = Container::new("tmp2".to_string(), 2, Color::Red, Icon::Tree, true);
        assert_eq!(container.kind(), ContainerKind::DeletesHistory);
    }

    #[test]
    fn test_color_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Color::Turquoise).unwrap(), "\"turquoise\"");
        let icon: Icon = serde_json::from_str("\"fingerprint\"").unwrap();
        assert_eq!(icon, Icon::Fingerprint);
    }
}

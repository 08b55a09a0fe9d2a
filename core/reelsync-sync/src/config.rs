//! Sync engine configuration.

use reelsync_storage::WriterConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which categories a navigation tree shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Everything, hidden or not.
    All,
    /// Only categories and groups the user has not hidden.
    #[default]
    VisibleOnly,
    /// Only hidden categories and groups.
    HiddenOnly,
}

/// User-configurable grouping of categories into navigation groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    pub grouping_enabled: bool,
    /// Token separating a group prefix from the category name, e.g. `"|"`
    /// in `"UK | News"`.
    pub separator: String,
    /// Group names the user has hidden.
    pub hidden_groups: HashSet<String>,
    /// Category ids the user has hidden.
    pub hidden_categories: HashSet<String>,
    pub filter_mode: FilterMode,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            grouping_enabled: true,
            separator: "|".to_string(),
            hidden_groups: HashSet::new(),
            hidden_categories: HashSet::new(),
            filter_mode: FilterMode::default(),
        }
    }
}

/// Configuration for the sync coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Chunking of bulk writes.
    pub writer: WriterConfig,
    /// Grouping used when capturing navigation snapshots.
    pub navigation: NavigationSettings,
    /// Batches the event bus keeps for slow subscribers.
    pub event_buffer: usize,
    /// Also diff item membership per category on every cycle.
    pub track_category_items: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            writer: WriterConfig::default(),
            navigation: NavigationSettings::default(),
            event_buffer: 8,
            track_category_items: false,
        }
    }
}

//! Fixture-backed catalog source and report formatting for the reelsync CLI.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reelsync_sync::{CatalogSource, ContentDiff, ContentState, SyncConfig, SyncError};
use reelsync_types::{ContentDomain, DomainPayload};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Serves each domain from `<dir>/<domain>.json`.
///
/// A missing or malformed file fails that domain only.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    dir: PathBuf,
}

impl FixtureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, domain: ContentDomain) -> PathBuf {
        self.dir.join(format!("{}.json", domain.as_str()))
    }
}

#[async_trait]
impl CatalogSource for FixtureSource {
    fn name(&self) -> &str {
        "fixtures"
    }

    async fn fetch(&self, domain: ContentDomain) -> reelsync_sync::Result<DomainPayload> {
        let path = self.path_for(domain);
        debug!("Reading {} fixture from {:?}", domain, path);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| SyncError::fetch(domain, format!("{}: {e}", path.display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| SyncError::fetch(domain, format!("{}: {e}", path.display())))
    }
}

/// Loads a `SyncConfig` from a JSON file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    let Some(path) = path else {
        return Ok(SyncConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config in {}", path.display()))
}

/// One-line rendering of a diff.
pub fn describe_diff(diff: &ContentDiff) -> String {
    match diff {
        ContentDiff::GroupAdded { domain, group } => format!(
            "[{domain}] + group {:?} ({} items)",
            group.name,
            group.item_count()
        ),
        ContentDiff::GroupRemoved { domain, group_name } => {
            format!("[{domain}] - group {group_name:?}")
        }
        ContentDiff::GroupCountChanged {
            domain,
            group_name,
            old_count,
            new_count,
        } => format!("[{domain}] ~ group {group_name:?}: {old_count} -> {new_count} items"),
        ContentDiff::ItemsAddedToCategory {
            domain,
            category_name,
            item_ids,
            ..
        } => format!(
            "[{domain}] + {} items in {category_name:?}",
            item_ids.len()
        ),
        ContentDiff::ItemsRemovedFromCategory {
            domain,
            category_name,
            item_ids,
            ..
        } => format!(
            "[{domain}] - {} items in {category_name:?}",
            item_ids.len()
        ),
    }
}

/// One-line rendering of a content state.
pub fn describe_state(state: &ContentState) -> String {
    match state {
        ContentState::Initial => "no data yet".to_string(),
        ContentState::SyncingFirstTime { phase, progress } => {
            format!("first sync {phase} ({:.0}%)", progress * 100.0)
        }
        ContentState::Ready {
            data,
            background_sync: None,
        } => format!(
            "ready: {} items in {} categories",
            data.item_count, data.category_count
        ),
        ContentState::Ready {
            data,
            background_sync: Some(phase),
        } => format!("ready: {} items, refreshing ({phase})", data.item_count),
        ContentState::Error { cause, phase } => format!("error while {phase}: {cause}"),
        ContentState::ErrorWithCache { data, cause, phase } => format!(
            "showing {} cached items, last sync failed while {phase}: {cause}",
            data.item_count
        ),
    }
}

//! Snapshot capture of the persisted catalog shape.
//!
//! A capture that fails yields `None`. Callers treat that as "no comparison
//! possible" and never as an error to propagate.

use crate::config::NavigationSettings;
use crate::navigation::{Category, Group, NavigationGrouper, NavigationTree};
use reelsync_storage::CatalogStore;
use reelsync_types::ContentDomain;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

/// Item ids per category id.
pub type CategoryItemIds = HashMap<String, HashSet<String>>;

/// Captures navigation trees from the catalog store.
#[derive(Clone)]
pub struct SnapshotCapturer {
    store: CatalogStore,
    grouper: Arc<dyn NavigationGrouper>,
    settings: NavigationSettings,
}

impl SnapshotCapturer {
    pub fn new(
        store: CatalogStore,
        grouper: Arc<dyn NavigationGrouper>,
        settings: NavigationSettings,
    ) -> Self {
        Self {
            store,
            grouper,
            settings,
        }
    }

    pub fn settings(&self) -> &NavigationSettings {
        &self.settings
    }

    /// Builds the current navigation tree of a domain.
    pub async fn capture(&self, domain: ContentDomain) -> Option<NavigationTree> {
        let store = self.store.clone();
        let grouper = self.grouper.clone();
        let settings = self.settings.clone();

        let result = tokio::task::spawn_blocking(move || {
            store.categories_with_counts(domain).map(|rows| {
                let categories = rows
                    .into_iter()
                    .map(|row| Category {
                        id: row.category_id,
                        name: row.name,
                        parent_id: row.parent_id,
                        item_count: row.item_count,
                    })
                    .collect();
                let tree = grouper.build_tree(categories, &settings);
                if settings.grouping_enabled {
                    strip_group_prefixes(tree, &settings.separator)
                } else {
                    tree
                }
            })
        })
        .await;

        match result {
            Ok(Ok(tree)) => Some(tree),
            Ok(Err(e)) => {
                warn!("Snapshot of {} unavailable: {}", domain, e);
                None
            }
            Err(e) => {
                warn!("spawn_blocking panicked capturing {}: {}", domain, e);
                None
            }
        }
    }

    /// Reads the item ids filed under each category of a domain.
    pub async fn capture_item_ids(&self, domain: ContentDomain) -> Option<CategoryItemIds> {
        let store = self.store.clone();
        match tokio::task::spawn_blocking(move || store.category_item_ids(domain)).await {
            Ok(Ok(ids)) => Some(ids),
            Ok(Err(e)) => {
                warn!("Item snapshot of {} unavailable: {}", domain, e);
                None
            }
            Err(e) => {
                warn!("spawn_blocking panicked capturing items of {}: {}", domain, e);
                None
            }
        }
    }
}

/// Removes `"<group><separator>"` from the front of category display names.
/// Category ids are untouched.
pub fn strip_group_prefixes(tree: NavigationTree, separator: &str) -> NavigationTree {
    if separator.is_empty() {
        return tree;
    }
    let groups = tree
        .into_groups()
        .into_iter()
        .map(|group| {
            let categories = group
                .categories
                .into_iter()
                .map(|mut category| {
                    if let Some((prefix, rest)) = category.name.split_once(separator) {
                        let rest = rest.trim();
                        if prefix.trim() == group.name && !rest.is_empty() {
                            category.name = rest.to_string();
                        }
                    }
                    category
                })
                .collect();
            Group::new(group.name, categories)
        })
        .collect();
    NavigationTree::new(groups)
}

//! Structural diffing of navigation trees.
//!
//! Diffs describe the shape of the catalog (groups, their item counts and
//! category membership), never individual item fields. Both functions are
//! pure and deterministic, so diffing a tree against itself yields nothing.

use crate::navigation::{Group, NavigationTree};
use crate::snapshot::CategoryItemIds;
use reelsync_types::ContentDomain;
use std::collections::{HashMap, HashSet};

/// A single structural change between two snapshots of a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentDiff {
    GroupAdded {
        domain: ContentDomain,
        group: Group,
    },
    GroupRemoved {
        domain: ContentDomain,
        group_name: String,
    },
    GroupCountChanged {
        domain: ContentDomain,
        group_name: String,
        old_count: u64,
        new_count: u64,
    },
    ItemsAddedToCategory {
        domain: ContentDomain,
        category_id: String,
        category_name: String,
        item_ids: Vec<String>,
    },
    ItemsRemovedFromCategory {
        domain: ContentDomain,
        category_id: String,
        category_name: String,
        item_ids: Vec<String>,
    },
}

impl ContentDiff {
    pub fn domain(&self) -> ContentDomain {
        match self {
            Self::GroupAdded { domain, .. }
            | Self::GroupRemoved { domain, .. }
            | Self::GroupCountChanged { domain, .. }
            | Self::ItemsAddedToCategory { domain, .. }
            | Self::ItemsRemovedFromCategory { domain, .. } => *domain,
        }
    }
}

/// Compares two trees of the same domain group by group.
///
/// Events come out as all additions (in `new` order), then all removals (in
/// `old` order), then all count changes (in `new` order).
pub fn diff_navigation_tree(
    domain: ContentDomain,
    old: &NavigationTree,
    new: &NavigationTree,
) -> Vec<ContentDiff> {
    let old_index: HashMap<&str, &Group> =
        old.groups().iter().map(|g| (g.name.as_str(), g)).collect();
    let new_index: HashMap<&str, &Group> =
        new.groups().iter().map(|g| (g.name.as_str(), g)).collect();

    let mut diffs = Vec::new();

    for group in new.groups() {
        if !old_index.contains_key(group.name.as_str()) {
            diffs.push(ContentDiff::GroupAdded {
                domain,
                group: group.clone(),
            });
        }
    }

    for group in old.groups() {
        if !new_index.contains_key(group.name.as_str()) {
            diffs.push(ContentDiff::GroupRemoved {
                domain,
                group_name: group.name.clone(),
            });
        }
    }

    for group in new.groups() {
        if let Some(previous) = old_index.get(group.name.as_str()) {
            let (old_count, new_count) = (previous.item_count(), group.item_count());
            if old_count != new_count {
                diffs.push(ContentDiff::GroupCountChanged {
                    domain,
                    group_name: group.name.clone(),
                    old_count,
                    new_count,
                });
            }
        }
    }

    diffs
}

/// Compares item membership of the categories present in both groups.
///
/// A category missing from an id map is treated as empty. Item ids in each
/// event are sorted.
pub fn diff_category_items(
    domain: ContentDomain,
    old_group: &Group,
    new_group: &Group,
    old_item_ids: &CategoryItemIds,
    new_item_ids: &CategoryItemIds,
) -> Vec<ContentDiff> {
    let empty = HashSet::new();
    let mut diffs = Vec::new();

    for category in &new_group.categories {
        if old_group.category(&category.id).is_none() {
            continue;
        }
        let old_ids = old_item_ids.get(&category.id).unwrap_or(&empty);
        let new_ids = new_item_ids.get(&category.id).unwrap_or(&empty);

        let added = sorted(new_ids.difference(old_ids));
        if !added.is_empty() {
            diffs.push(ContentDiff::ItemsAddedToCategory {
                domain,
                category_id: category.id.clone(),
                category_name: category.name.clone(),
                item_ids: added,
            });
        }

        let removed = sorted(old_ids.difference(new_ids));
        if !removed.is_empty() {
            diffs.push(ContentDiff::ItemsRemovedFromCategory {
                domain,
                category_id: category.id.clone(),
                category_name: category.name.clone(),
                item_ids: removed,
            });
        }
    }

    diffs
}

fn sorted<'a>(ids: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut ids: Vec<String> = ids.cloned().collect();
    ids.sort_unstable();
    ids
}

//! Navigation trees: the grouped shape of a domain's catalog.
//!
//! A tree is rebuilt from the persisted categories at every capture point and
//! replaced wholesale; nothing mutates a tree after it is built. Group names
//! are unique within a tree and category ids are unique within a group.

use crate::config::{FilterMode, NavigationSettings};
use std::collections::{HashMap, HashSet};

/// Name of the single group produced when grouping is disabled.
pub const ALL_GROUP: &str = "All";

/// A category entry in a navigation group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub item_count: u64,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, item_count: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            item_count,
        }
    }
}

/// A named group of categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub categories: Vec<Category>,
}

impl Group {
    pub fn new(name: impl Into<String>, categories: Vec<Category>) -> Self {
        Self {
            name: name.into(),
            categories,
        }
    }

    /// Total items across the group's categories.
    pub fn item_count(&self) -> u64 {
        self.categories.iter().map(|c| c.item_count).sum()
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }
}

/// Ordered list of groups for one domain at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationTree {
    groups: Vec<Group>,
}

impl NavigationTree {
    /// Builds a tree, merging groups that share a name and dropping repeated
    /// category ids within a group. First occurrence wins.
    pub fn new(groups: Vec<Group>) -> Self {
        let mut merged: Vec<Group> = Vec::with_capacity(groups.len());
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut seen: Vec<HashSet<String>> = Vec::with_capacity(groups.len());

        for group in groups {
            let slot = match index.get(&group.name) {
                Some(&slot) => slot,
                None => {
                    index.insert(group.name.clone(), merged.len());
                    merged.push(Group::new(group.name, Vec::new()));
                    seen.push(HashSet::new());
                    merged.len() - 1
                }
            };
            for category in group.categories {
                if seen[slot].insert(category.id.clone()) {
                    merged[slot].categories.push(category);
                }
            }
        }

        Self { groups: merged }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Total items across all groups.
    pub fn item_count(&self) -> u64 {
        self.groups.iter().map(Group::item_count).sum()
    }

    pub(crate) fn into_groups(self) -> Vec<Group> {
        self.groups
    }
}

/// Turns a flat category list into a navigation tree.
///
/// Implementations must be pure: the same categories and settings always
/// yield the same tree.
pub trait NavigationGrouper: Send + Sync {
    fn build_tree(&self, categories: Vec<Category>, settings: &NavigationSettings) -> NavigationTree;
}

/// Groups categories by the text before the first separator.
///
/// `"UK | News"` with separator `"|"` lands in group `"UK"`. A category
/// without the separator forms a group named after itself. Groups keep the
/// order in which they are first seen. An empty separator disables grouping.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixGrouper;

impl PrefixGrouper {
    fn group_name<'a>(name: &'a str, separator: &str) -> &'a str {
        match name.split_once(separator) {
            Some((prefix, _)) if !prefix.trim().is_empty() => prefix.trim(),
            _ => name.trim(),
        }
    }
}

impl NavigationGrouper for PrefixGrouper {
    fn build_tree(&self, categories: Vec<Category>, settings: &NavigationSettings) -> NavigationTree {
        let grouping = settings.grouping_enabled && !settings.separator.is_empty();

        let visible: Vec<Category> = categories
            .into_iter()
            .filter(|category| {
                let group = if grouping {
                    Self::group_name(&category.name, &settings.separator)
                } else {
                    ALL_GROUP
                };
                let hidden = settings.hidden_categories.contains(&category.id)
                    || settings.hidden_groups.contains(group);
                match settings.filter_mode {
                    FilterMode::All => true,
                    FilterMode::VisibleOnly => !hidden,
                    FilterMode::HiddenOnly => hidden,
                }
            })
            .collect();

        if !grouping {
            if visible.is_empty() {
                return NavigationTree::default();
            }
            return NavigationTree::new(vec![Group::new(ALL_GROUP, visible)]);
        }

        let groups = visible
            .into_iter()
            .map(|category| {
                let name = Self::group_name(&category.name, &settings.separator).to_string();
                Group::new(name, vec![category])
            })
            .collect();
        NavigationTree::new(groups)
    }
}

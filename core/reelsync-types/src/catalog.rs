//! Catalog records as delivered by the remote source.
//!
//! Records are mirror-only: the remote catalog is the source of truth and the
//! local store replaces rows keyed by `(domain, id)` on every sync.

use serde::{Deserialize, Serialize};

/// A category of a content domain (e.g. "UK | Sports").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Remote identifier, unique within the domain.
    pub category_id: String,
    /// Display name, possibly carrying a group prefix.
    pub name: String,
    /// Parent category, if the remote catalog nests categories.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Position in the remote listing.
    #[serde(default)]
    pub sort_order: i64,
}

impl CategoryRecord {
    /// Creates a top-level category.
    pub fn new(category_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
            name: name.into(),
            parent_id: None,
            sort_order: 0,
        }
    }
}

/// A single movie, series or live channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Remote identifier, unique within the domain.
    pub item_id: String,
    /// Category the item is listed under.
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub sort_order: i64,
    /// Remaining remote fields, stored opaquely.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CatalogItem {
    /// Creates an item with an empty payload.
    pub fn new(
        item_id: impl Into<String>,
        category_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            category_id: category_id.into(),
            name: name.into(),
            sort_order: 0,
            payload: serde_json::Value::Null,
        }
    }
}

/// Everything the remote source returns for one domain in one fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainPayload {
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

impl DomainPayload {
    /// Total number of rows this payload will write.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len() + self.items.len()
    }

    /// Returns true if the payload carries no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.items.is_empty()
    }
}

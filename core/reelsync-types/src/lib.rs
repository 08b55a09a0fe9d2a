//! Core type definitions for reelsync.
//!
//! This crate defines the plain data shared by the storage layer and the
//! sync engine:
//! - The three independently synced content domains
//! - Category and item records as delivered by the remote catalog
//! - Millisecond wall-clock timestamps used by the cache ledger
//!
//! Nothing here performs I/O.

mod catalog;
mod domain;
mod timestamp;

pub use catalog::{CatalogItem, CategoryRecord, DomainPayload};
pub use domain::ContentDomain;
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown content domain: {0}")]
    UnknownDomain(String),
}

//! SQLite storage layer for reelsync.
//!
//! Mirrors the remote catalog into a single-writer SQLite database and keeps
//! the per-domain cache ledger next to it.
//!
//! # Architecture
//!
//! - One [`rusqlite::Connection`] behind one mutex; that mutex is the write
//!   lock shared by every content domain
//! - [`BulkWriter`] holds the lock for an entire multi-chunk write and issues
//!   multi-row `INSERT OR REPLACE` statements sized to the bound-parameter
//!   ceiling
//! - Rows carry a write generation so a completed write can prune what the
//!   remote catalog no longer lists
//! - The `cache_ledger` table holds one freshness record per domain

mod catalog_store;
mod error;
mod ledger;
mod writer;

pub use catalog_store::{CatalogStore, CategoryCount};
pub use error::{StorageError, StorageResult};
pub use ledger::{LedgerRecord, SyncStatus};
pub use writer::{BulkRecord, BulkWriter, WriteReport, WriterConfig};

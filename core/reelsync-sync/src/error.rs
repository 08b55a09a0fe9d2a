//! Error types for the sync layer.

use reelsync_storage::StorageError;
use reelsync_types::ContentDomain;
use thiserror::Error;

/// Result type for sync operations.
pub type Result<T, E = SyncError> = std::result::Result<T, E>;

/// Errors that can occur while syncing a domain.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote source could not deliver a domain.
    #[error("fetch failed for {domain}: {reason}")]
    Fetch {
        domain: ContentDomain,
        reason: String,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A blocking storage task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl SyncError {
    /// Convenience constructor for source implementations.
    pub fn fetch(domain: ContentDomain, reason: impl Into<String>) -> Self {
        Self::Fetch {
            domain,
            reason: reason.into(),
        }
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

//! Remote catalog source abstraction.
//!
//! Authentication and transport live behind this trait; the engine only
//! sees whether a domain's fetch succeeded.

use crate::error::Result;
use async_trait::async_trait;
use reelsync_types::{ContentDomain, DomainPayload};

/// Delivers the full remote listing of a domain.
///
/// Implementations own their timeouts. Any error is treated as a failure of
/// that domain only.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Returns the name of the source, for logs.
    fn name(&self) -> &str {
        "remote"
    }

    /// Fetches every category and item of a domain.
    async fn fetch(&self, domain: ContentDomain) -> Result<DomainPayload>;
}

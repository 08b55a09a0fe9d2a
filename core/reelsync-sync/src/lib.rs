//! Background catalog sync and change propagation for reelsync.
//!
//! Mirrors three independent content domains (movies, series, live
//! channels) from a remote catalog into the local store without blocking
//! the user, and tells reactive consumers what changed.
//!
//! # Architecture
//!
//! ## Components
//!
//! - **Snapshot**: Builds the navigation tree of a domain from the store
//! - **Diff**: Compares two trees and produces typed change events
//! - **Event bus**: Broadcasts diff batches, favoring the most recent
//! - **State**: Per-domain sync status, watchable
//! - **Ledger**: O(1) freshness and "do I have data" answers
//! - **Content**: Combines status and ledger into one renderable state
//! - **Coordinator**: Runs the cycle end to end
//!
//! ## Sync Cycle
//!
//! 1. **Capture old**: Snapshot every domain's navigation tree
//! 2. **Fetch and persist**: Pull each domain and bulk-write it, concurrently
//! 3. **Capture new**: Snapshot again
//! 4. **Diff**: Compare the snapshots of every domain that succeeded
//! 5. **Publish**: Hand all diffs to the event bus in one batch
//! 6. **Ledger**: Record success or failure per domain
//!
//! # Example
//!
//! ```no_run
//! use reelsync_storage::CatalogStore;
//! use reelsync_sync::{
//!     CacheLedger, CatalogSource, EventBus, PrefixGrouper, SyncConfig, SyncCoordinator,
//!     SyncStatusBoard,
//! };
//! use std::sync::Arc;
//!
//! # async fn run(source: Arc<dyn CatalogSource>) -> reelsync_sync::Result<()> {
//! let config = SyncConfig::default();
//! let store = CatalogStore::open_in_memory()?;
//! let ledger = CacheLedger::load(store.clone()).await?;
//! let coordinator = SyncCoordinator::new(
//!     source,
//!     Arc::new(PrefixGrouper),
//!     store,
//!     ledger,
//!     EventBus::new(config.event_buffer),
//!     SyncStatusBoard::new(),
//!     config,
//! );
//!
//! let result = coordinator.sync_all().await;
//! assert!(result.is_success());
//! # Ok(())
//! # }
//! ```

mod config;
mod content;
mod coordinator;
mod diff;
mod error;
mod event_bus;
mod ledger;
pub mod navigation;
mod snapshot;
mod source;
pub mod state;

pub use config::{FilterMode, NavigationSettings, SyncConfig};
pub use content::{content_state, watch_content, ContentState};
pub use coordinator::{DomainOutcomes, SyncCoordinator, SyncResult};
pub use diff::{diff_category_items, diff_navigation_tree, ContentDiff};
pub use error::{Result, SyncError};
pub use event_bus::{for_domain, DiffBatch, DiffSubscriber, EventBus};
pub use ledger::CacheLedger;
pub use navigation::{Category, Group, NavigationGrouper, NavigationTree, PrefixGrouper};
pub use snapshot::{strip_group_prefixes, CategoryItemIds, SnapshotCapturer};
pub use source::CatalogSource;
pub use state::{DataState, SyncPhase, SyncStatusBoard};

//! Per-domain sync status.
//!
//! The coordinator publishes where each domain is in the current cycle. The
//! status board is one of the two signals the content-state combinator
//! reads; the other is the cache ledger.

use reelsync_types::ContentDomain;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Step of a sync cycle a domain is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    CapturingBaseline,
    Fetching,
    Persisting,
    CapturingResult,
    Diffing,
    Publishing,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CapturingBaseline => "capturing baseline",
            Self::Fetching => "fetching",
            Self::Persisting => "persisting",
            Self::CapturingResult => "capturing result",
            Self::Diffing => "diffing",
            Self::Publishing => "publishing",
        };
        f.write_str(s)
    }
}

/// Sync status of one domain.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DataState {
    /// No sync has run since startup.
    #[default]
    Idle,
    /// A cycle is running; `progress` is in `0.0..=1.0` within `phase`.
    Loading { phase: SyncPhase, progress: f32 },
    /// The last cycle succeeded.
    Succeeded,
    /// The last cycle failed during `phase`.
    Failed { cause: String, phase: SyncPhase },
}

impl DataState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

/// Watchable sync status of every domain.
#[derive(Clone)]
pub struct SyncStatusBoard {
    channels: Arc<HashMap<ContentDomain, watch::Sender<DataState>>>,
}

impl SyncStatusBoard {
    pub fn new() -> Self {
        let channels = ContentDomain::ALL
            .into_iter()
            .map(|domain| (domain, watch::channel(DataState::Idle).0))
            .collect();
        Self {
            channels: Arc::new(channels),
        }
    }

    fn channel(&self, domain: ContentDomain) -> &watch::Sender<DataState> {
        // Every domain is inserted in `new`.
        &self.channels[&domain]
    }

    /// Current status of a domain.
    pub fn get(&self, domain: ContentDomain) -> DataState {
        self.channel(domain).borrow().clone()
    }

    pub fn set(&self, domain: ContentDomain, state: DataState) {
        self.channel(domain).send_replace(state);
    }

    pub fn set_loading(&self, domain: ContentDomain, phase: SyncPhase, progress: f32) {
        self.set(
            domain,
            DataState::Loading {
                phase,
                progress: progress.clamp(0.0, 1.0),
            },
        );
    }

    pub fn subscribe(&self, domain: ContentDomain) -> watch::Receiver<DataState> {
        self.channel(domain).subscribe()
    }
}

impl Default for SyncStatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

//! User-facing content readiness.
//!
//! Combines the in-flight sync status with the cache ledger. The status is
//! consulted before an empty ledger is taken at face value, so a consumer
//! never sees "no data" while the first sync is still populating the store.

use crate::ledger::CacheLedger;
use crate::state::{DataState, SyncPhase, SyncStatusBoard};
use reelsync_storage::LedgerRecord;
use reelsync_types::ContentDomain;
use tokio::sync::watch;
use tracing::debug;

/// The single value a consumer inspects to decide what to render.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentState {
    /// Never synced and nothing cached.
    Initial,
    /// First sync running with nothing cached yet.
    SyncingFirstTime { phase: SyncPhase, progress: f32 },
    /// Data is available. `background_sync` is set while a refresh runs.
    Ready {
        data: LedgerRecord,
        background_sync: Option<SyncPhase>,
    },
    /// Sync failed and there is nothing to show.
    Error { cause: String, phase: SyncPhase },
    /// Sync failed but cached data is still shown.
    ErrorWithCache {
        data: LedgerRecord,
        cause: String,
        phase: SyncPhase,
    },
}

impl ContentState {
    /// Derives the content state from a sync status and the domain's ledger
    /// record. A record counts as cache only if it holds items.
    pub fn resolve(
        domain: ContentDomain,
        status: &DataState,
        record: Option<&LedgerRecord>,
    ) -> Self {
        let cached = record.filter(|r| r.has_data());

        match (status, cached) {
            (DataState::Idle, None) => Self::Initial,
            (DataState::Idle, Some(data)) => Self::Ready {
                data: data.clone(),
                background_sync: None,
            },
            (DataState::Loading { phase, progress }, None) => Self::SyncingFirstTime {
                phase: *phase,
                progress: *progress,
            },
            (DataState::Loading { phase, .. }, Some(data)) => Self::Ready {
                data: data.clone(),
                background_sync: Some(*phase),
            },
            // A successful sync of an empty catalog is still ready, just empty.
            (DataState::Succeeded, _) => Self::Ready {
                data: record
                    .cloned()
                    .unwrap_or_else(|| LedgerRecord::empty(domain)),
                background_sync: None,
            },
            (DataState::Failed { cause, phase }, None) => Self::Error {
                cause: cause.clone(),
                phase: *phase,
            },
            (DataState::Failed { cause, phase }, Some(data)) => Self::ErrorWithCache {
                data: data.clone(),
                cause: cause.clone(),
                phase: *phase,
            },
        }
    }

    /// The data payload, if this state carries one.
    pub fn data(&self) -> Option<&LedgerRecord> {
        match self {
            Self::Ready { data, .. } | Self::ErrorWithCache { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Returns true if the failure should block the UI.
    pub fn is_blocking_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Current content state of a domain.
pub fn content_state(
    domain: ContentDomain,
    board: &SyncStatusBoard,
    ledger: &CacheLedger,
) -> ContentState {
    let status = board.get(domain);
    let record = ledger.record(domain);
    ContentState::resolve(domain, &status, record.as_ref())
}

/// Keeps a `ContentState` up to date as either signal changes.
///
/// The background task ends when every receiver is dropped or both sources
/// are gone. Must be called inside a Tokio runtime.
pub fn watch_content(
    domain: ContentDomain,
    board: &SyncStatusBoard,
    ledger: &CacheLedger,
) -> watch::Receiver<ContentState> {
    let mut status_rx = board.subscribe(domain);
    let mut ledger_rx = ledger.subscribe(domain);

    let initial = ContentState::resolve(
        domain,
        &status_rx.borrow_and_update(),
        ledger_rx.borrow_and_update().as_ref(),
    );
    let (tx, rx) = watch::channel(initial);

    tokio::spawn(async move {
        let mut status_open = true;
        let mut ledger_open = true;
        while (status_open || ledger_open) && !tx.is_closed() {
            tokio::select! {
                changed = status_rx.changed(), if status_open => {
                    status_open = changed.is_ok();
                }
                changed = ledger_rx.changed(), if ledger_open => {
                    ledger_open = changed.is_ok();
                }
                _ = tx.closed() => break,
            }

            let next = ContentState::resolve(
                domain,
                &status_rx.borrow_and_update(),
                ledger_rx.borrow_and_update().as_ref(),
            );
            tx.send_if_modified(|current| {
                if *current == next {
                    false
                } else {
                    *current = next;
                    true
                }
            });
        }
        debug!("Content watcher for {} stopped", domain);
    });

    rx
}

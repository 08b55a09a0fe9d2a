//! Fan-out of diff batches to reactive subscribers.
//!
//! Built on a `tokio::sync::broadcast` channel: publishing never waits for
//! subscribers, and a subscriber that falls more than `capacity` batches
//! behind loses the oldest ones. Batches are notifications, not a log;
//! a subscriber that lags re-reads the cache ledger or a fresh snapshot.

use crate::diff::ContentDiff;
use reelsync_types::ContentDomain;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

/// One published set of diffs, possibly spanning several domains.
pub type DiffBatch = Arc<[ContentDiff]>;

/// Broadcasts diff batches.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DiffBatch>,
}

impl EventBus {
    /// Creates a bus keeping at most `capacity` unread batches per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a batch. Returns the number of subscribers it reached.
    /// Empty batches are not published.
    pub fn publish(&self, diffs: Vec<ContentDiff>) -> usize {
        if diffs.is_empty() {
            return 0;
        }
        let count = diffs.len();
        match self.sender.send(diffs.into()) {
            Ok(receivers) => {
                debug!("Published {} diffs to {} subscribers", count, receivers);
                receivers
            }
            Err(_) => {
                debug!("Dropped {} diffs: no subscribers", count);
                0
            }
        }
    }

    pub fn subscribe(&self) -> DiffSubscriber {
        DiffSubscriber {
            receiver: self.sender.subscribe(),
            missed: 0,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving end of the event bus.
pub struct DiffSubscriber {
    receiver: broadcast::Receiver<DiffBatch>,
    missed: u64,
}

impl DiffSubscriber {
    /// Waits for the next batch. Skips over batches lost to lag.
    /// Returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<DiffBatch> {
        loop {
            match self.receiver.recv().await {
                Ok(batch) => return Some(batch),
                Err(RecvError::Lagged(n)) => self.note_lag(n),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next batch if one is already queued.
    pub fn try_recv(&mut self) -> Option<DiffBatch> {
        loop {
            match self.receiver.try_recv() {
                Ok(batch) => return Some(batch),
                Err(TryRecvError::Lagged(n)) => self.note_lag(n),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Batches this subscriber lost by lagging behind.
    pub fn missed(&self) -> u64 {
        self.missed
    }

    fn note_lag(&mut self, n: u64) {
        warn!("Diff subscriber lagged, {} batches dropped", n);
        self.missed += n;
    }
}

/// Diffs of `batch` that belong to `domain`.
pub fn for_domain(batch: &DiffBatch, domain: ContentDomain) -> impl Iterator<Item = &ContentDiff> {
    batch.iter().filter(move |d| d.domain() == domain)
}

//! Sync coordinator: one end-to-end refresh of the catalog mirror.
//!
//! A cycle runs in barrier-separated phases, each fanning out over the
//! requested domains and joining on all of them:
//!
//! 1. capture the old navigation trees
//! 2. fetch and persist every domain
//! 3. capture the new navigation trees
//! 4. diff old against new where both exist and the domain succeeded
//! 5. publish the combined diffs in one batch
//! 6. update the cache ledger and the status board
//!
//! Domains fail independently: each domain's fetch and write runs on its own
//! task, so even a panicking source only fails its own domain. The cycle
//! reports failure only when every requested domain failed.

use crate::config::SyncConfig;
use crate::diff::{diff_category_items, diff_navigation_tree, ContentDiff};
use crate::error::{Result, SyncError};
use crate::event_bus::EventBus;
use crate::ledger::CacheLedger;
use crate::navigation::{NavigationGrouper, NavigationTree};
use crate::snapshot::{CategoryItemIds, SnapshotCapturer};
use crate::source::CatalogSource;
use crate::state::{DataState, SyncPhase, SyncStatusBoard};
use futures::future::join_all;
use reelsync_storage::{BulkWriter, CatalogStore, WriteReport};
use reelsync_types::{ContentDomain, Timestamp};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Per-domain success flags of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainOutcomes {
    pub movies: bool,
    pub series: bool,
    pub live_channels: bool,
}

impl DomainOutcomes {
    pub fn get(&self, domain: ContentDomain) -> bool {
        match domain {
            ContentDomain::Movies => self.movies,
            ContentDomain::Series => self.series,
            ContentDomain::LiveChannels => self.live_channels,
        }
    }

    pub fn set(&mut self, domain: ContentDomain, succeeded: bool) {
        match domain {
            ContentDomain::Movies => self.movies = succeeded,
            ContentDomain::Series => self.series = succeeded,
            ContentDomain::LiveChannels => self.live_channels = succeeded,
        }
    }

    pub fn any(&self) -> bool {
        self.movies || self.series || self.live_channels
    }
}

/// Outcome of one coordinator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncResult {
    /// At least one domain succeeded.
    Success {
        total_diffs: usize,
        domains: DomainOutcomes,
    },
    /// Every requested domain failed, or the cycle itself broke.
    Failure { cause: String },
}

impl SyncResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Why a domain failed, and where.
struct DomainFailure {
    phase: SyncPhase,
    error: SyncError,
}

/// Orchestrates sync cycles. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn CatalogSource>,
    writer: BulkWriter,
    snapshots: SnapshotCapturer,
    ledger: CacheLedger,
    bus: EventBus,
    status: SyncStatusBoard,
    track_category_items: bool,
    /// Serializes overlapping triggers.
    cycle: Mutex<()>,
}

impl SyncCoordinator {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        grouper: Arc<dyn NavigationGrouper>,
        store: CatalogStore,
        ledger: CacheLedger,
        bus: EventBus,
        status: SyncStatusBoard,
        config: SyncConfig,
    ) -> Self {
        let writer = store.writer(config.writer);
        let snapshots = SnapshotCapturer::new(store, grouper, config.navigation);
        Self {
            inner: Arc::new(Inner {
                source,
                writer,
                snapshots,
                ledger,
                bus,
                status,
                track_category_items: config.track_category_items,
                cycle: Mutex::new(()),
            }),
        }
    }

    pub fn ledger(&self) -> &CacheLedger {
        &self.inner.ledger
    }

    pub fn status(&self) -> &SyncStatusBoard {
        &self.inner.status
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Runs one full cycle over every domain.
    pub async fn sync_all(&self) -> SyncResult {
        self.run(ContentDomain::ALL.to_vec()).await
    }

    /// Runs one cycle for a single domain.
    pub async fn sync_domain(&self, domain: ContentDomain) -> SyncResult {
        self.run(vec![domain]).await
    }

    /// The cycle runs on its own task: a caller that stops waiting never
    /// interrupts a write or a ledger update, and a panic becomes a failure.
    async fn run(&self, domains: Vec<ContentDomain>) -> SyncResult {
        let inner = self.inner.clone();
        let requested = domains.clone();
        match tokio::spawn(async move { inner.cycle(&domains).await }).await {
            Ok(result) => result,
            Err(e) => {
                error!("Sync cycle aborted: {}", e);
                let cause = format!("sync cycle aborted: {e}");
                self.inner.abandon(&requested, &cause).await;
                SyncResult::Failure { cause }
            }
        }
    }
}

impl Inner {
    async fn cycle(self: &Arc<Self>, domains: &[ContentDomain]) -> SyncResult {
        let _running = self.cycle.lock().await;
        let started = Instant::now();
        let attempt = Timestamp::now();
        info!("Starting sync cycle for {} domains", domains.len());

        for &domain in domains {
            self.status.set_loading(domain, SyncPhase::CapturingBaseline, 0.0);
            if let Err(e) = self.ledger.mark_in_progress(domain, attempt).await {
                warn!("Failed to mark {} in progress: {}", domain, e);
            }
        }

        // Phase 1: baseline snapshots.
        let old_trees = self.capture_trees(domains).await;
        let old_items = self.capture_item_ids(domains).await;

        // Phase 2: fetch and persist, one task per domain.
        let tasks = domains.iter().map(|&domain| {
            let inner = Arc::clone(self);
            tokio::spawn(async move { inner.fetch_and_persist(domain).await })
        });
        let outcomes: Vec<Result<WriteReport, DomainFailure>> = join_all(tasks)
            .await
            .into_iter()
            .zip(domains)
            .map(|(joined, &domain)| joined.unwrap_or_else(|e| Err(self.task_failure(domain, e))))
            .collect();

        for (&domain, outcome) in domains.iter().zip(&outcomes) {
            if outcome.is_ok() {
                self.status.set_loading(domain, SyncPhase::CapturingResult, 0.0);
            }
        }

        // Phase 3: result snapshots.
        let new_trees = self.capture_trees(domains).await;
        let new_items = self.capture_item_ids(domains).await;

        // Phase 4: diff, one blocking task per domain.
        let snapshots = old_trees
            .into_iter()
            .zip(new_trees)
            .zip(old_items.into_iter().zip(new_items));
        let mut pending = Vec::new();
        for ((&domain, outcome), ((old, new), (old_ids, new_ids))) in
            domains.iter().zip(&outcomes).zip(snapshots)
        {
            if outcome.is_err() {
                continue;
            }
            self.status.set_loading(domain, SyncPhase::Diffing, 0.0);
            let (Some(old), Some(new)) = (old, new) else {
                continue;
            };
            pending.push(tokio::task::spawn_blocking(move || {
                domain_diffs(domain, &old, &new, &old_ids, &new_ids)
            }));
        }
        let mut diffs = Vec::new();
        for joined in join_all(pending).await {
            match joined {
                Ok(found) => diffs.extend(found),
                Err(e) => warn!("Diffing task failed: {}", e),
            }
        }

        // Phase 5: publish.
        let total_diffs = diffs.len();
        if !diffs.is_empty() {
            for (&domain, outcome) in domains.iter().zip(&outcomes) {
                if outcome.is_ok() {
                    self.status.set_loading(domain, SyncPhase::Publishing, 0.0);
                }
            }
            self.bus.publish(diffs);
        }

        // Phase 6: ledger and status.
        let finished = Timestamp::now();
        let mut flags = DomainOutcomes::default();
        let mut causes = Vec::new();
        for (&domain, outcome) in domains.iter().zip(outcomes) {
            match outcome {
                Ok(report) => {
                    flags.set(domain, true);
                    if let Err(e) = self.ledger.record_success(domain, &report, finished).await {
                        error!("Failed to update ledger for {}: {}", domain, e);
                    }
                    self.status.set(domain, DataState::Succeeded);
                }
                Err(failure) => {
                    let cause = failure.error.to_string();
                    if let Err(e) = self.ledger.record_failure(domain, cause.clone(), finished).await {
                        error!("Failed to update ledger for {}: {}", domain, e);
                    }
                    self.status.set(
                        domain,
                        DataState::Failed {
                            cause: cause.clone(),
                            phase: failure.phase,
                        },
                    );
                    causes.push(format!("{domain}: {cause}"));
                }
            }
        }

        info!(
            "Sync cycle finished in {:?}: {} diffs, {}/{} domains succeeded",
            started.elapsed(),
            total_diffs,
            domains.len() - causes.len(),
            domains.len()
        );

        if flags.any() {
            SyncResult::Success {
                total_diffs,
                domains: flags,
            }
        } else {
            SyncResult::Failure {
                cause: causes.join("; "),
            }
        }
    }

    /// Turns a domain task that panicked or was cancelled into a failure of
    /// that domain, attributed to the phase it had reached.
    fn task_failure(&self, domain: ContentDomain, err: tokio::task::JoinError) -> DomainFailure {
        let phase = match self.status.get(domain) {
            DataState::Loading { phase, .. } => phase,
            _ => SyncPhase::Fetching,
        };
        error!("Sync of {} aborted while {}: {}", domain, phase, err);
        DomainFailure {
            phase,
            error: SyncError::from(err),
        }
    }

    /// Settles every requested domain after the cycle itself died, so no
    /// status or ledger record is left in progress.
    async fn abandon(&self, domains: &[ContentDomain], cause: &str) {
        let _running = self.cycle.lock().await;
        let at = Timestamp::now();
        for &domain in domains {
            let phase = match self.status.get(domain) {
                DataState::Loading { phase, .. } => phase,
                _ => SyncPhase::CapturingBaseline,
            };
            if let Err(e) = self.ledger.record_failure(domain, cause, at).await {
                error!("Failed to update ledger for {}: {}", domain, e);
            }
            self.status.set(
                domain,
                DataState::Failed {
                    cause: cause.to_string(),
                    phase,
                },
            );
        }
    }

    async fn capture_trees(&self, domains: &[ContentDomain]) -> Vec<Option<NavigationTree>> {
        join_all(domains.iter().map(|&d| self.snapshots.capture(d))).await
    }

    async fn capture_item_ids(&self, domains: &[ContentDomain]) -> Vec<Option<CategoryItemIds>> {
        if !self.track_category_items {
            return vec![None; domains.len()];
        }
        join_all(domains.iter().map(|&d| self.snapshots.capture_item_ids(d))).await
    }

    async fn fetch_and_persist(&self, domain: ContentDomain) -> Result<WriteReport, DomainFailure> {
        self.status.set_loading(domain, SyncPhase::Fetching, 0.0);
        let payload = self.source.fetch(domain).await.map_err(|error| {
            warn!("Fetching {} from {} failed: {}", domain, self.source.name(), error);
            DomainFailure {
                phase: SyncPhase::Fetching,
                error,
            }
        })?;

        info!(
            "Fetched {} categories and {} items for {}",
            payload.categories.len(),
            payload.items.len(),
            domain
        );
        self.status.set_loading(domain, SyncPhase::Persisting, 0.0);

        let writer = self.writer.clone();
        let status = self.status.clone();
        let written = tokio::task::spawn_blocking(move || {
            writer.write_with_progress(domain, &payload, |done, total| {
                let progress = if total == 0 { 1.0 } else { done as f32 / total as f32 };
                status.set_loading(domain, SyncPhase::Persisting, progress);
            })
        })
        .await
        .map_err(SyncError::from)
        .and_then(|r| r.map_err(SyncError::from));

        written.map_err(|error| {
            warn!("Persisting {} failed: {}", domain, error);
            DomainFailure {
                phase: SyncPhase::Persisting,
                error,
            }
        })
    }
}

/// Group-level diffs of a domain, followed by per-category item diffs when
/// both item snapshots are present.
fn domain_diffs(
    domain: ContentDomain,
    old: &NavigationTree,
    new: &NavigationTree,
    old_items: &Option<CategoryItemIds>,
    new_items: &Option<CategoryItemIds>,
) -> Vec<ContentDiff> {
    let mut diffs = diff_navigation_tree(domain, old, new);

    if let (Some(old_ids), Some(new_ids)) = (old_items, new_items) {
        for group in new.groups() {
            if let Some(previous) = old.group(&group.name) {
                diffs.extend(diff_category_items(domain, previous, group, old_ids, new_ids));
            }
        }
    }

    diffs
}

//! In-memory view of the cache ledger.
//!
//! Records are loaded once and kept in watch channels, so freshness checks
//! never touch the database. Every update writes through to the store first
//! and publishes only after the write succeeded.

use crate::error::Result;
use reelsync_storage::{CatalogStore, LedgerRecord, SyncStatus, WriteReport};
use reelsync_types::{ContentDomain, Timestamp};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Handle to the per-domain cache ledger.
#[derive(Clone)]
pub struct CacheLedger {
    store: CatalogStore,
    records: Arc<HashMap<ContentDomain, watch::Sender<Option<LedgerRecord>>>>,
}

impl CacheLedger {
    /// Loads all ledger records from the store.
    pub async fn load(store: CatalogStore) -> Result<Self> {
        let reader = store.clone();
        let persisted = tokio::task::spawn_blocking(move || reader.load_all_ledgers()).await??;

        let mut by_domain: HashMap<ContentDomain, LedgerRecord> =
            persisted.into_iter().map(|r| (r.domain, r)).collect();
        let records = ContentDomain::ALL
            .into_iter()
            .map(|domain| (domain, watch::channel(by_domain.remove(&domain)).0))
            .collect();

        Ok(Self {
            store,
            records: Arc::new(records),
        })
    }

    fn channel(&self, domain: ContentDomain) -> &watch::Sender<Option<LedgerRecord>> {
        // Every domain is inserted in `load`.
        &self.records[&domain]
    }

    /// The ledger record of a domain, if it was ever synced.
    pub fn record(&self, domain: ContentDomain) -> Option<LedgerRecord> {
        self.channel(domain).borrow().clone()
    }

    /// Returns true if the mirror holds items for this domain.
    pub fn has_usable_data(&self, domain: ContentDomain) -> bool {
        self.channel(domain)
            .borrow()
            .as_ref()
            .is_some_and(LedgerRecord::has_data)
    }

    /// Returns true if the domain has data that was synced within `max_age`.
    pub fn is_fresh(&self, domain: ContentDomain, max_age: Duration) -> bool {
        let now = Timestamp::now();
        self.channel(domain).borrow().as_ref().is_some_and(|r| {
            r.has_data() && r.last_sync_success.is_some_and(|ts| ts.is_within(max_age, now))
        })
    }

    pub fn subscribe(&self, domain: ContentDomain) -> watch::Receiver<Option<LedgerRecord>> {
        self.channel(domain).subscribe()
    }

    /// Records that a sync attempt started.
    pub async fn mark_in_progress(&self, domain: ContentDomain, at: Timestamp) -> Result<()> {
        let mut record = self.current(domain);
        record.sync_status = SyncStatus::InProgress;
        record.last_sync_attempt = Some(at);
        self.persist(record).await
    }

    /// Records a successful write. Counts come from the write report.
    pub async fn record_success(
        &self,
        domain: ContentDomain,
        report: &WriteReport,
        at: Timestamp,
    ) -> Result<()> {
        let mut record = self.current(domain);
        record.item_count = report.item_count;
        record.category_count = report.category_count;
        record.last_updated = Some(at);
        record.last_sync_attempt = Some(at);
        record.last_sync_success = Some(at);
        record.sync_status = SyncStatus::Success;
        record.last_sync_error = None;
        self.persist(record).await
    }

    /// Records a failed attempt. Counts and the last success are kept.
    pub async fn record_failure(
        &self,
        domain: ContentDomain,
        error: impl Into<String>,
        at: Timestamp,
    ) -> Result<()> {
        let mut record = self.current(domain);
        record.last_sync_attempt = Some(at);
        record.sync_status = SyncStatus::Failed;
        record.last_sync_error = Some(error.into());
        self.persist(record).await
    }

    /// Drops the mirrored rows and the ledger record of a domain.
    pub async fn clear(&self, domain: ContentDomain) -> Result<()> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.clear_domain(domain)).await??;
        self.channel(domain).send_replace(None);
        debug!("Cleared cache of {}", domain);
        Ok(())
    }

    fn current(&self, domain: ContentDomain) -> LedgerRecord {
        self.record(domain)
            .unwrap_or_else(|| LedgerRecord::empty(domain))
    }

    async fn persist(&self, record: LedgerRecord) -> Result<()> {
        let store = self.store.clone();
        let to_write = record.clone();
        tokio::task::spawn_blocking(move || store.upsert_ledger(&to_write)).await??;
        self.channel(record.domain).send_replace(Some(record));
        Ok(())
    }
}

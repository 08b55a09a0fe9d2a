//! Shared test helpers for sync tests.

#![allow(dead_code)]

use async_trait::async_trait;
use reelsync_storage::CatalogStore;
use reelsync_sync::{
    CacheLedger, CatalogSource, EventBus, NavigationGrouper, PrefixGrouper, SyncConfig,
    SyncCoordinator, SyncError, SyncStatusBoard,
};
use reelsync_types::{CatalogItem, CategoryRecord, ContentDomain, DomainPayload};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Source whose per-domain answers are set by the test.
#[derive(Default)]
pub struct ScriptedSource {
    answers: Mutex<HashMap<ContentDomain, Result<DomainPayload, String>>>,
    calls: Mutex<Vec<ContentDomain>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        let source = Self::default();
        for domain in ContentDomain::ALL {
            source.serve(domain, DomainPayload::default());
        }
        Arc::new(source)
    }

    pub fn serve(&self, domain: ContentDomain, payload: DomainPayload) {
        self.answers.lock().unwrap().insert(domain, Ok(payload));
    }

    pub fn fail(&self, domain: ContentDomain, reason: &str) {
        self.answers
            .lock()
            .unwrap()
            .insert(domain, Err(reason.to_string()));
    }

    pub fn calls(&self) -> Vec<ContentDomain> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, domain: ContentDomain) -> reelsync_sync::Result<DomainPayload> {
        self.calls.lock().unwrap().push(domain);
        let answer = self.answers.lock().unwrap().get(&domain).cloned();
        match answer {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(reason)) => Err(SyncError::fetch(domain, reason)),
            None => Err(SyncError::fetch(domain, "no answer scripted")),
        }
    }
}

/// Builds a payload from `(category_id, display_name, item_count)` triples.
/// Item ids are `<category_id>-<n>`.
pub fn payload(categories: &[(&str, &str, usize)]) -> DomainPayload {
    let mut out = DomainPayload::default();
    for (order, (id, name, count)) in categories.iter().enumerate() {
        let mut category = CategoryRecord::new(*id, *name);
        category.sort_order = order as i64;
        out.categories.push(category);
        for n in 0..*count {
            out.items
                .push(CatalogItem::new(format!("{id}-{n}"), *id, format!("{name} #{n}")));
        }
    }
    out
}

/// Payload with explicit item ids for one category.
pub fn payload_with_items(id: &str, name: &str, item_ids: &[&str]) -> DomainPayload {
    DomainPayload {
        categories: vec![CategoryRecord::new(id, name)],
        items: item_ids
            .iter()
            .map(|item| CatalogItem::new(*item, id, *item))
            .collect(),
    }
}

pub struct Harness {
    pub source: Arc<ScriptedSource>,
    pub store: CatalogStore,
    pub coordinator: SyncCoordinator,
}

pub async fn harness(config: SyncConfig) -> Harness {
    harness_with(CatalogStore::open_in_memory().unwrap(), config).await
}

/// Harness over a caller-provided store, e.g. a file-backed one.
pub async fn harness_with(store: CatalogStore, config: SyncConfig) -> Harness {
    let source = ScriptedSource::new();
    let coordinator =
        coordinator_for(source.clone(), Arc::new(PrefixGrouper), store.clone(), config).await;
    Harness {
        source,
        store,
        coordinator,
    }
}

/// Coordinator over arbitrary collaborators.
pub async fn coordinator_for(
    source: Arc<dyn CatalogSource>,
    grouper: Arc<dyn NavigationGrouper>,
    store: CatalogStore,
    config: SyncConfig,
) -> SyncCoordinator {
    let ledger = CacheLedger::load(store.clone()).await.unwrap();
    SyncCoordinator::new(
        source,
        grouper,
        store,
        ledger,
        EventBus::new(config.event_buffer),
        SyncStatusBoard::new(),
        config,
    )
}

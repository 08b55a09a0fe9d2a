use pretty_assertions::assert_eq;
use reelsync_storage::{CatalogStore, CategoryCount, LedgerRecord, SyncStatus, WriterConfig};
use reelsync_types::{CatalogItem, CategoryRecord, ContentDomain, DomainPayload, Timestamp};

fn seeded() -> CatalogStore {
    let store = CatalogStore::open_in_memory().unwrap();
    let mut news = CategoryRecord::new("10", "UK | News");
    news.sort_order = 2;
    let mut sport = CategoryRecord::new("11", "UK | Sport");
    sport.sort_order = 1;
    let mut empty = CategoryRecord::new("12", "US | Empty");
    empty.sort_order = 3;
    empty.parent_id = Some("1".into());

    let payload = DomainPayload {
        categories: vec![news, sport, empty],
        items: vec![
            CatalogItem::new("a", "10", "BBC News"),
            CatalogItem::new("b", "10", "Sky News"),
            CatalogItem::new("c", "11", "Sky Sports"),
        ],
    };
    store
        .writer(WriterConfig::default())
        .write(ContentDomain::LiveChannels, &payload)
        .unwrap();
    store
}

// ── Catalog reads ────────────────────────────────────────────────

#[test]
fn categories_with_counts_in_remote_order() {
    let store = seeded();
    let cats = store.categories_with_counts(ContentDomain::LiveChannels).unwrap();
    assert_eq!(
        cats,
        vec![
            CategoryCount {
                category_id: "11".into(),
                name: "UK | Sport".into(),
                parent_id: None,
                item_count: 1,
            },
            CategoryCount {
                category_id: "10".into(),
                name: "UK | News".into(),
                parent_id: None,
                item_count: 2,
            },
            CategoryCount {
                category_id: "12".into(),
                name: "US | Empty".into(),
                parent_id: Some("1".into()),
                item_count: 0,
            },
        ]
    );
}

#[test]
fn categories_of_other_domain_are_empty() {
    let store = seeded();
    assert!(store.categories_with_counts(ContentDomain::Movies).unwrap().is_empty());
}

#[test]
fn category_item_ids_groups_by_category() {
    let store = seeded();
    let ids = store.category_item_ids(ContentDomain::LiveChannels).unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids["10"].len(), 2);
    assert!(ids["10"].contains("a") && ids["10"].contains("b"));
    assert!(ids["11"].contains("c"));
}

#[test]
fn clear_domain_removes_rows_and_ledger() {
    let store = seeded();
    let mut record = LedgerRecord::empty(ContentDomain::LiveChannels);
    record.item_count = 3;
    store.upsert_ledger(&record).unwrap();

    store.clear_domain(ContentDomain::LiveChannels).unwrap();

    assert_eq!(store.item_count(ContentDomain::LiveChannels).unwrap(), 0);
    assert_eq!(store.category_count(ContentDomain::LiveChannels).unwrap(), 0);
    assert!(store.load_ledger(ContentDomain::LiveChannels).unwrap().is_none());
}

// ── Ledger ───────────────────────────────────────────────────────

#[test]
fn missing_ledger_is_none() {
    let store = CatalogStore::open_in_memory().unwrap();
    assert!(store.load_ledger(ContentDomain::Movies).unwrap().is_none());
    assert!(store.load_all_ledgers().unwrap().is_empty());
}

#[test]
fn ledger_upsert_replaces_record() {
    let store = CatalogStore::open_in_memory().unwrap();
    let mut record = LedgerRecord::empty(ContentDomain::Series);
    record.item_count = 10;
    record.category_count = 2;
    record.sync_status = SyncStatus::Success;
    record.last_sync_success = Some(Timestamp::from_millis(1_000));
    record.last_sync_attempt = Some(Timestamp::from_millis(1_000));
    record.last_updated = Some(Timestamp::from_millis(1_000));
    store.upsert_ledger(&record).unwrap();

    let mut failed = record.clone();
    failed.sync_status = SyncStatus::Failed;
    failed.last_sync_attempt = Some(Timestamp::from_millis(2_000));
    failed.last_sync_error = Some("timeout".into());
    store.upsert_ledger(&failed).unwrap();

    let loaded = store.load_ledger(ContentDomain::Series).unwrap().unwrap();
    assert_eq!(loaded, failed);
    assert_eq!(store.load_all_ledgers().unwrap().len(), 1);
}

#[test]
fn delete_ledger_leaves_catalog_rows() {
    let store = seeded();
    store
        .upsert_ledger(&LedgerRecord::empty(ContentDomain::LiveChannels))
        .unwrap();
    store.delete_ledger(ContentDomain::LiveChannels).unwrap();

    assert!(store.load_ledger(ContentDomain::LiveChannels).unwrap().is_none());
    assert_eq!(store.item_count(ContentDomain::LiveChannels).unwrap(), 3);
}

#[test]
fn sync_status_parse_roundtrip_and_reject() {
    for status in [SyncStatus::Idle, SyncStatus::InProgress, SyncStatus::Success, SyncStatus::Failed] {
        assert_eq!(status.as_str().parse::<SyncStatus>().unwrap(), status);
    }
    assert!("paused".parse::<SyncStatus>().is_err());
}

#[test]
fn has_data_follows_item_count() {
    let mut record = LedgerRecord::empty(ContentDomain::Movies);
    assert!(!record.has_data());
    record.item_count = 1;
    assert!(record.has_data());
}

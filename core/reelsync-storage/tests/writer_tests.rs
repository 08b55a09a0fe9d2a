use reelsync_storage::{CatalogStore, WriterConfig};
use reelsync_types::{CatalogItem, CategoryRecord, ContentDomain, DomainPayload};
use std::collections::HashSet;
use std::sync::{Arc, Barrier, Mutex};

fn payload(categories: usize, items: usize) -> DomainPayload {
    let categories: Vec<CategoryRecord> = (0..categories)
        .map(|c| CategoryRecord::new(format!("c{c}"), format!("Group | Cat {c}")))
        .collect();
    let items = (0..items)
        .map(|i| CatalogItem::new(format!("i{i}"), format!("c{}", i % categories.len().max(1)), format!("Item {i}")))
        .collect();
    DomainPayload { categories, items }
}

fn config(chunk_size: usize, max_bound_params: usize) -> WriterConfig {
    WriterConfig {
        chunk_size,
        max_bound_params,
    }
}

fn all_item_ids(store: &CatalogStore, domain: ContentDomain) -> Vec<String> {
    store
        .category_item_ids(domain)
        .unwrap()
        .into_values()
        .flatten()
        .collect()
}

// ── Chunking ─────────────────────────────────────────────────────

#[test]
fn twelve_thousand_rows_land_exactly_once_for_any_chunking() {
    let data = payload(40, 12_000);
    for (chunk_size, params) in [(2_000, 999), (5_000, 999), (1_000, 70), (12_000, 32_766), (7, 999)] {
        let store = CatalogStore::open_in_memory().unwrap();
        let report = store
            .writer(config(chunk_size, params))
            .write(ContentDomain::Movies, &data)
            .unwrap();

        assert_eq!(report.items_written, 12_000);
        assert_eq!(report.item_count, 12_000);
        assert_eq!(report.category_count, 40);

        let ids = all_item_ids(&store, ContentDomain::Movies);
        let unique: HashSet<_> = ids.iter().cloned().collect();
        assert_eq!(ids.len(), 12_000, "chunk_size={chunk_size} params={params}");
        assert_eq!(unique.len(), 12_000);
    }
}

#[test]
fn chunk_and_statement_counts_follow_config() {
    let store = CatalogStore::open_in_memory().unwrap();
    let report = store
        .writer(config(2_000, 999))
        .write(ContentDomain::Series, &payload(10, 12_000))
        .unwrap();

    // 1 category chunk + 6 item chunks.
    assert_eq!(report.chunks, 7);
    // Items bind 7 params: 142 rows per statement, 15 statements per 2000-row chunk.
    // Categories bind 6 params: 10 rows fit one statement.
    assert_eq!(report.statements, 1 + 6 * 15);
}

#[test]
fn parameter_ceiling_below_one_row_still_writes() {
    let store = CatalogStore::open_in_memory().unwrap();
    let report = store
        .writer(config(100, 1))
        .write(ContentDomain::Movies, &payload(2, 50))
        .unwrap();
    assert_eq!(report.item_count, 50);
    assert_eq!(report.statements, 52);
}

#[test]
fn progress_reports_every_chunk() {
    let store = CatalogStore::open_in_memory().unwrap();
    let mut seen = Vec::new();
    store
        .writer(config(1_000, 999))
        .write_with_progress(ContentDomain::Movies, &payload(5, 2_500), |done, total| {
            seen.push((done, total))
        })
        .unwrap();
    assert_eq!(seen, vec![(5, 2_505), (1_005, 2_505), (2_005, 2_505), (2_505, 2_505)]);
}

// ── Upsert & prune ───────────────────────────────────────────────

#[test]
fn rewrite_replaces_rows_instead_of_duplicating() {
    let store = CatalogStore::open_in_memory().unwrap();
    let writer = store.writer(WriterConfig::default());
    let data = payload(3, 300);

    writer.write(ContentDomain::Movies, &data).unwrap();
    let second = writer.write(ContentDomain::Movies, &data).unwrap();

    assert_eq!(second.item_count, 300);
    assert_eq!(second.items_pruned, 0);
    assert_eq!(second.categories_pruned, 0);
}

#[test]
fn rows_missing_from_new_payload_are_pruned() {
    let store = CatalogStore::open_in_memory().unwrap();
    let writer = store.writer(WriterConfig::default());

    writer.write(ContentDomain::Movies, &payload(4, 100)).unwrap();
    let report = writer.write(ContentDomain::Movies, &payload(2, 60)).unwrap();

    assert_eq!(report.items_pruned, 40);
    assert_eq!(report.categories_pruned, 2);
    assert_eq!(store.item_count(ContentDomain::Movies).unwrap(), 60);
    assert_eq!(store.category_count(ContentDomain::Movies).unwrap(), 2);
}

#[test]
fn domains_do_not_prune_each_other() {
    let store = CatalogStore::open_in_memory().unwrap();
    let writer = store.writer(WriterConfig::default());

    writer.write(ContentDomain::Movies, &payload(2, 20)).unwrap();
    writer.write(ContentDomain::Series, &payload(3, 30)).unwrap();

    assert_eq!(store.item_count(ContentDomain::Movies).unwrap(), 20);
    assert_eq!(store.item_count(ContentDomain::Series).unwrap(), 30);
}

#[test]
fn same_item_id_in_two_domains_is_two_rows() {
    let store = CatalogStore::open_in_memory().unwrap();
    let writer = store.writer(WriterConfig::default());
    let data = payload(1, 5);

    writer.write(ContentDomain::Movies, &data).unwrap();
    writer.write(ContentDomain::LiveChannels, &data).unwrap();

    assert_eq!(store.item_count(ContentDomain::Movies).unwrap(), 5);
    assert_eq!(store.item_count(ContentDomain::LiveChannels).unwrap(), 5);
}

#[test]
fn empty_payload_clears_domain() {
    let store = CatalogStore::open_in_memory().unwrap();
    let writer = store.writer(WriterConfig::default());

    writer.write(ContentDomain::Movies, &payload(2, 10)).unwrap();
    let report = writer.write(ContentDomain::Movies, &DomainPayload::default()).unwrap();

    assert_eq!(report.chunks, 0);
    assert_eq!(report.item_count, 0);
    assert_eq!(report.category_count, 0);
}

// ── Serialization across domains ─────────────────────────────────

#[test]
fn concurrent_writers_serialize_on_one_lock() {
    let store = CatalogStore::open_in_memory().unwrap();
    let barrier = Arc::new(Barrier::new(3));
    let commits: Arc<Mutex<Vec<(ContentDomain, usize)>>> = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = ContentDomain::ALL
        .into_iter()
        .map(|domain| {
            let writer = store.writer(config(500, 999));
            let barrier = barrier.clone();
            let commits = commits.clone();
            std::thread::spawn(move || {
                barrier.wait();
                writer
                    .write_with_progress(domain, &payload(8, 4_000), |written, _| {
                        commits.lock().unwrap().push((domain, written));
                    })
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        let report = handle.join().unwrap();
        assert_eq!(report.item_count, 4_000);
        assert_eq!(report.chunks, 9);
    }
    for domain in ContentDomain::ALL {
        assert_eq!(store.item_count(domain).unwrap(), 4_000);
    }

    // Every chunk of one write commits before any chunk of the next.
    let commits = commits.lock().unwrap();
    assert_eq!(commits.len(), 27);
    let mut runs: Vec<(ContentDomain, Vec<usize>)> = Vec::new();
    for &(domain, written) in commits.iter() {
        match runs.last_mut() {
            Some((current, progress)) if *current == domain => progress.push(written),
            _ => runs.push((domain, vec![written])),
        }
    }
    assert_eq!(runs.len(), 3, "chunks interleaved: {commits:?}");
    let domains: HashSet<ContentDomain> = runs.iter().map(|(d, _)| *d).collect();
    assert_eq!(domains.len(), 3);
    for (_, progress) in &runs {
        assert_eq!(progress.len(), 9);
        assert!(progress.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(progress.last(), Some(&4_008));
    }
}

#[test]
fn file_backed_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mirror").join("catalog.db");
    {
        let store = CatalogStore::open(&path).unwrap();
        store
            .writer(WriterConfig::default())
            .write(ContentDomain::Series, &payload(2, 25))
            .unwrap();
    }
    let reopened = CatalogStore::open(&path).unwrap();
    assert_eq!(reopened.item_count(ContentDomain::Series).unwrap(), 25);
}

// ── Logging ──────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn every_committed_chunk_is_logged() {
    let log = CapturedLog::default();
    let sink = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || sink.clone())
        .finish();

    let store = CatalogStore::open_in_memory().unwrap();
    let report = tracing::subscriber::with_default(subscriber, || {
        store
            .writer(config(5, 999))
            .write(ContentDomain::Movies, &payload(3, 10))
            .unwrap()
    });

    assert_eq!(report.chunks, 3);
    let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
    assert_eq!(output.matches("category chunk").count(), 1, "{output}");
    assert_eq!(output.matches("item chunk").count(), 2, "{output}");
}

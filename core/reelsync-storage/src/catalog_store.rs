//! The catalog mirror database.

use crate::error::{StorageError, StorageResult};
use crate::ledger::{self, LedgerRecord};
use crate::writer::{BulkWriter, WriterConfig};
use reelsync_types::ContentDomain;
use rusqlite::{params, Connection};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// A persisted category together with the number of items filed under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category_id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub item_count: u64,
}

/// Local mirror of the remote catalog backed by SQLite.
///
/// Cloning is cheap and every clone shares the same connection, so the
/// connection mutex is the single write lock for the whole process.
#[derive(Clone)]
pub struct CatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogStore {
    /// Opens (or creates) a catalog store at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory catalog store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS categories (
                domain TEXT NOT NULL,
                category_id TEXT NOT NULL,
                name TEXT NOT NULL,
                parent_id TEXT,
                sort_order INTEGER NOT NULL DEFAULT 0,
                generation TEXT NOT NULL,
                PRIMARY KEY (domain, category_id)
            );

            CREATE TABLE IF NOT EXISTS catalog_items (
                domain TEXT NOT NULL,
                item_id TEXT NOT NULL,
                category_id TEXT NOT NULL,
                name TEXT NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                payload TEXT,
                generation TEXT NOT NULL,
                PRIMARY KEY (domain, item_id)
            );

            CREATE INDEX IF NOT EXISTS idx_catalog_items_category
                ON catalog_items (domain, category_id);

            CREATE TABLE IF NOT EXISTS cache_ledger (
                domain TEXT PRIMARY KEY,
                item_count INTEGER NOT NULL,
                category_count INTEGER NOT NULL,
                last_updated INTEGER,
                last_sync_attempt INTEGER,
                last_sync_success INTEGER,
                sync_status TEXT NOT NULL,
                last_sync_error TEXT
            );
            ",
        )?;
        Ok(())
    }

    pub(crate) fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Closed)
    }

    /// Returns a bulk writer sharing this store's write lock.
    pub fn writer(&self, config: WriterConfig) -> BulkWriter {
        BulkWriter::new(self.conn.clone(), config)
    }

    // ── Catalog reads ────────────────────────────────────────────

    /// Lists a domain's categories in remote order with their item counts.
    pub fn categories_with_counts(
        &self,
        domain: ContentDomain,
    ) -> StorageResult<Vec<CategoryCount>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT c.category_id, c.name, c.parent_id, COUNT(i.item_id)
             FROM categories c
             LEFT JOIN catalog_items i
                ON i.domain = c.domain AND i.category_id = c.category_id
             WHERE c.domain = ?1
             GROUP BY c.category_id, c.name, c.parent_id, c.sort_order
             ORDER BY c.sort_order, c.category_id",
        )?;
        let rows = stmt.query_map(params![domain.as_str()], |row| {
            let count: i64 = row.get(3)?;
            Ok(CategoryCount {
                category_id: row.get(0)?,
                name: row.get(1)?,
                parent_id: row.get(2)?,
                item_count: count.max(0) as u64,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Item ids per category for a domain.
    pub fn category_item_ids(
        &self,
        domain: ContentDomain,
    ) -> StorageResult<HashMap<String, HashSet<String>>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT category_id, item_id FROM catalog_items WHERE domain = ?1",
        )?;
        let rows = stmt.query_map(params![domain.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut result: HashMap<String, HashSet<String>> = HashMap::new();
        for row in rows {
            let (category_id, item_id) = row?;
            result.entry(category_id).or_default().insert(item_id);
        }
        Ok(result)
    }

    /// Number of persisted items in a domain.
    pub fn item_count(&self, domain: ContentDomain) -> StorageResult<u64> {
        let conn = self.lock()?;
        count_rows(&conn, "catalog_items", domain)
    }

    /// Number of persisted categories in a domain.
    pub fn category_count(&self, domain: ContentDomain) -> StorageResult<u64> {
        let conn = self.lock()?;
        count_rows(&conn, "categories", domain)
    }

    /// Deletes every mirrored row and the ledger record of a domain.
    pub fn clear_domain(&self, domain: ContentDomain) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM catalog_items WHERE domain = ?1",
            params![domain.as_str()],
        )?;
        tx.execute(
            "DELETE FROM categories WHERE domain = ?1",
            params![domain.as_str()],
        )?;
        tx.execute(
            "DELETE FROM cache_ledger WHERE domain = ?1",
            params![domain.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    // ── Cache ledger ─────────────────────────────────────────────

    /// Loads the ledger record of a domain, if one exists.
    pub fn load_ledger(&self, domain: ContentDomain) -> StorageResult<Option<LedgerRecord>> {
        let conn = self.lock()?;
        ledger::load(&conn, domain)
    }

    /// Loads every ledger record.
    pub fn load_all_ledgers(&self) -> StorageResult<Vec<LedgerRecord>> {
        let conn = self.lock()?;
        ledger::load_all(&conn)
    }

    /// Replaces the ledger record of `record.domain`.
    pub fn upsert_ledger(&self, record: &LedgerRecord) -> StorageResult<()> {
        let conn = self.lock()?;
        ledger::upsert(&conn, record)
    }

    /// Removes the ledger record of a domain.
    pub fn delete_ledger(&self, domain: ContentDomain) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM cache_ledger WHERE domain = ?1",
            params![domain.as_str()],
        )?;
        Ok(())
    }
}

pub(crate) fn count_rows(conn: &Connection, table: &str, domain: ContentDomain) -> StorageResult<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE domain = ?1"),
        params![domain.as_str()],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

//! Serialized bulk writer.
//!
//! A write acquires the store's single connection lock once and keeps it for
//! every chunk, so two domains can never interleave transactions. Each chunk
//! is its own transaction; within a chunk rows go out as multi-row
//! `INSERT OR REPLACE` statements sized to the bound-parameter ceiling.
//!
//! Chunk boundaries are commit points. A failure part way through leaves the
//! earlier chunks committed and skips pruning, so the next full sync simply
//! upserts the same keys again.

use crate::catalog_store::count_rows;
use crate::error::{StorageError, StorageResult};
use reelsync_types::{CatalogItem, CategoryRecord, ContentDomain, DomainPayload};
use rusqlite::{params, params_from_iter, Connection, ToSql};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Tuning for the bulk writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Rows committed per transaction.
    pub chunk_size: usize,
    /// Bound-parameter ceiling of a single statement.
    pub max_bound_params: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2_000,
            max_bound_params: 999,
        }
    }
}

impl WriterConfig {
    /// Rows per multi-row insert for a record with `columns` bound columns.
    pub fn rows_per_statement(&self, columns: usize) -> usize {
        (self.max_bound_params / columns.max(1)).max(1)
    }
}

/// A row type the bulk writer knows how to bind.
pub trait BulkRecord {
    /// Target table.
    const TABLE: &'static str;
    /// Record columns, in `bind` order. The writer adds `domain` in front
    /// and `generation` at the end.
    const COLUMNS: &'static [&'static str];

    /// Pushes one value per column onto `out`.
    fn bind<'a>(&'a self, out: &mut Vec<&'a dyn ToSql>);

    /// Bound parameters per row, including the writer's own columns.
    fn bound_columns() -> usize {
        Self::COLUMNS.len() + 2
    }
}

impl BulkRecord for CategoryRecord {
    const TABLE: &'static str = "categories";
    const COLUMNS: &'static [&'static str] = &["category_id", "name", "parent_id", "sort_order"];

    fn bind<'a>(&'a self, out: &mut Vec<&'a dyn ToSql>) {
        out.push(&self.category_id);
        out.push(&self.name);
        out.push(&self.parent_id);
        out.push(&self.sort_order);
    }
}

impl BulkRecord for CatalogItem {
    const TABLE: &'static str = "catalog_items";
    const COLUMNS: &'static [&'static str] =
        &["item_id", "category_id", "name", "sort_order", "payload"];

    fn bind<'a>(&'a self, out: &mut Vec<&'a dyn ToSql>) {
        out.push(&self.item_id);
        out.push(&self.category_id);
        out.push(&self.name);
        out.push(&self.sort_order);
        out.push(&self.payload);
    }
}

/// Summary of one completed write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub categories_written: usize,
    pub items_written: usize,
    pub categories_pruned: usize,
    pub items_pruned: usize,
    /// Transactions committed, excluding the prune.
    pub chunks: usize,
    /// Multi-row insert statements executed.
    pub statements: usize,
    /// Persisted item count after the write, read under the write lock.
    pub item_count: u64,
    /// Persisted category count after the write, read under the write lock.
    pub category_count: u64,
}

/// The single logical writer of the catalog mirror.
#[derive(Clone)]
pub struct BulkWriter {
    conn: Arc<Mutex<Connection>>,
    config: WriterConfig,
}

impl BulkWriter {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>, config: WriterConfig) -> Self {
        Self { conn, config }
    }

    pub fn config(&self) -> WriterConfig {
        self.config
    }

    /// Persists a domain payload. Blocks; call from a blocking context.
    pub fn write(&self, domain: ContentDomain, payload: &DomainPayload) -> StorageResult<WriteReport> {
        self.write_with_progress(domain, payload, |_, _| {})
    }

    /// Persists a domain payload, reporting `(rows_written, rows_total)`
    /// after every committed chunk.
    pub fn write_with_progress<F>(
        &self,
        domain: ContentDomain,
        payload: &DomainPayload,
        mut progress: F,
    ) -> StorageResult<WriteReport>
    where
        F: FnMut(usize, usize),
    {
        let mut guard = self.conn.lock().map_err(|_| StorageError::Closed)?;
        let conn: &mut Connection = &mut guard;

        let generation = Uuid::now_v7().to_string();
        let total = payload.len();
        let mut report = WriteReport::default();
        let mut written = 0;

        for chunk in payload.categories.chunks(self.config.chunk_size.max(1)) {
            report.statements += self.write_chunk(conn, domain, &generation, chunk)?;
            report.chunks += 1;
            report.categories_written += chunk.len();
            written += chunk.len();
            debug!(
                "Committed {} category chunk {} ({}/{} rows)",
                domain, report.chunks, written, total
            );
            progress(written, total);
        }

        for chunk in payload.items.chunks(self.config.chunk_size.max(1)) {
            report.statements += self.write_chunk(conn, domain, &generation, chunk)?;
            report.chunks += 1;
            report.items_written += chunk.len();
            written += chunk.len();
            debug!(
                "Committed {} item chunk {} ({}/{} rows)",
                domain, report.chunks, written, total
            );
            progress(written, total);
        }

        let tx = conn.transaction()?;
        report.categories_pruned = tx.execute(
            "DELETE FROM categories WHERE domain = ?1 AND generation <> ?2",
            params![domain.as_str(), generation],
        )?;
        report.items_pruned = tx.execute(
            "DELETE FROM catalog_items WHERE domain = ?1 AND generation <> ?2",
            params![domain.as_str(), generation],
        )?;
        tx.commit()?;

        report.item_count = count_rows(conn, "catalog_items", domain)?;
        report.category_count = count_rows(conn, "categories", domain)?;
        Ok(report)
    }

    /// Writes one transaction worth of rows. Returns the statement count.
    fn write_chunk<R: BulkRecord>(
        &self,
        conn: &mut Connection,
        domain: ContentDomain,
        generation: &str,
        rows: &[R],
    ) -> StorageResult<usize> {
        let per_statement = self.config.rows_per_statement(R::bound_columns());
        let domain_key = domain.as_str();
        let mut statements = 0;

        let tx = conn.transaction()?;
        for batch in rows.chunks(per_statement) {
            let sql = insert_sql::<R>(batch.len());
            let mut stmt = tx.prepare_cached(&sql)?;
            let mut values: Vec<&dyn ToSql> = Vec::with_capacity(batch.len() * R::bound_columns());
            for row in batch {
                values.push(&domain_key);
                row.bind(&mut values);
                values.push(&generation);
            }
            stmt.execute(params_from_iter(values))?;
            statements += 1;
        }
        tx.commit()?;
        Ok(statements)
    }
}

fn insert_sql<R: BulkRecord>(rows: usize) -> String {
    let placeholders = vec!["?"; R::bound_columns()].join(", ");
    let tuple = format!("({placeholders})");
    let values = vec![tuple.as_str(); rows].join(", ");
    format!(
        "INSERT OR REPLACE INTO {} (domain, {}, generation) VALUES {}",
        R::TABLE,
        R::COLUMNS.join(", "),
        values
    )
}

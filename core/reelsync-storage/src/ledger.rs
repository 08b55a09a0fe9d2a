//! Cache ledger rows.
//!
//! One row per content domain. Answering "is there usable data" reads this
//! row instead of counting the catalog tables.

use crate::error::{StorageError, StorageResult};
use reelsync_types::{ContentDomain, Timestamp};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of the most recent sync attempt for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncStatus {
    Idle,
    InProgress,
    Success,
    Failed,
}

impl SyncStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "in_progress" => Ok(Self::InProgress),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(StorageError::InvalidData(format!("unknown sync status: {other}"))),
        }
    }
}

/// Freshness record of one content domain.
///
/// `item_count` and `category_count` describe the store as of the last
/// successful write, never an in-flight fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub domain: ContentDomain,
    pub item_count: u64,
    pub category_count: u64,
    pub last_updated: Option<Timestamp>,
    pub last_sync_attempt: Option<Timestamp>,
    pub last_sync_success: Option<Timestamp>,
    pub sync_status: SyncStatus,
    pub last_sync_error: Option<String>,
}

impl LedgerRecord {
    /// A record for a domain that has never been synced.
    pub fn empty(domain: ContentDomain) -> Self {
        Self {
            domain,
            item_count: 0,
            category_count: 0,
            last_updated: None,
            last_sync_attempt: None,
            last_sync_success: None,
            sync_status: SyncStatus::Idle,
            last_sync_error: None,
        }
    }

    /// Returns true if the mirror holds at least one item for this domain.
    pub fn has_data(&self) -> bool {
        self.item_count > 0
    }
}

const COLUMNS: &str = "domain, item_count, category_count, last_updated, \
    last_sync_attempt, last_sync_success, sync_status, last_sync_error";

pub(crate) fn load(conn: &Connection, domain: ContentDomain) -> StorageResult<Option<LedgerRecord>> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM cache_ledger WHERE domain = ?1"),
            params![domain.as_str()],
            RawRecord::from_row,
        )
        .optional()?;
    raw.map(RawRecord::decode).transpose()
}

pub(crate) fn load_all(conn: &Connection) -> StorageResult<Vec<LedgerRecord>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM cache_ledger ORDER BY domain"))?;
    let rows = stmt.query_map([], RawRecord::from_row)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row?.decode()?);
    }
    Ok(result)
}

pub(crate) fn upsert(conn: &Connection, record: &LedgerRecord) -> StorageResult<()> {
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO cache_ledger ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ),
        params![
            record.domain.as_str(),
            record.item_count as i64,
            record.category_count as i64,
            record.last_updated.map(millis),
            record.last_sync_attempt.map(millis),
            record.last_sync_success.map(millis),
            record.sync_status.as_str(),
            record.last_sync_error,
        ],
    )?;
    Ok(())
}

fn millis(ts: Timestamp) -> i64 {
    ts.as_millis() as i64
}

fn timestamp(raw: Option<i64>) -> Option<Timestamp> {
    raw.map(|ms| Timestamp::from_millis(ms.max(0) as u64))
}

/// Column values as read, before enum decoding.
struct RawRecord {
    domain: String,
    item_count: i64,
    category_count: i64,
    last_updated: Option<i64>,
    last_sync_attempt: Option<i64>,
    last_sync_success: Option<i64>,
    sync_status: String,
    last_sync_error: Option<String>,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            domain: row.get(0)?,
            item_count: row.get(1)?,
            category_count: row.get(2)?,
            last_updated: row.get(3)?,
            last_sync_attempt: row.get(4)?,
            last_sync_success: row.get(5)?,
            sync_status: row.get(6)?,
            last_sync_error: row.get(7)?,
        })
    }

    fn decode(self) -> StorageResult<LedgerRecord> {
        let domain: ContentDomain = self
            .domain
            .parse()
            .map_err(|e| StorageError::InvalidData(format!("{e}")))?;
        Ok(LedgerRecord {
            domain,
            item_count: self.item_count.max(0) as u64,
            category_count: self.category_count.max(0) as u64,
            last_updated: timestamp(self.last_updated),
            last_sync_attempt: timestamp(self.last_sync_attempt),
            last_sync_success: timestamp(self.last_sync_success),
            sync_status: self.sync_status.parse()?,
            last_sync_error: self.last_sync_error,
        })
    }
}

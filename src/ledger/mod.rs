//! Durable per-date post ledger backed by SQLite.
//!
//! One row per calendar date: the water amount used (or voted for), the
//! supporting vote count, and the external media id once the post is
//! published. The ledger is the single source of truth for "is this the
//! first cycle" and "what was yesterday's outcome".
//!
//! Inserts are keyed by date with native upsert semantics, so a cycle
//! re-run after a partial failure rewrites the same row instead of
//! appending a duplicate.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("missing required field: {0}")]
    Validation(&'static str),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One row of the posts table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub date: NaiveDate,
    /// External media id; set exactly once, after a successful publish.
    pub media_id: Option<String>,
    pub water_amount: u32,
    pub vote_count: u32,
}

/// Insert payload for a new row.
///
/// Amount and count are optional here so callers assembling a draft from
/// partial data get a validation error before anything is written,
/// rather than a row with silent defaults.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub date: NaiveDate,
    pub water_amount: Option<u32>,
    pub vote_count: Option<u32>,
}

impl PostDraft {
    pub fn new(date: NaiveDate, water_amount: u32, vote_count: u32) -> Self {
        Self {
            date,
            water_amount: Some(water_amount),
            vote_count: Some(vote_count),
        }
    }
}

/// SQLite-backed post ledger.
///
/// The connection is exclusively owned for the lifetime of the process
/// run and closed on drop, error paths included.
pub struct PostLedger {
    conn: Connection,
}

impl PostLedger {
    /// Open (or create) the ledger database at the given path.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// In-memory ledger for tests.
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Create the posts table if it does not exist. Safe to call every run.
    pub fn ensure_schema(&self) -> Result<(), LedgerError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS posts (
                 date TEXT PRIMARY KEY,
                 id TEXT,
                 water_amount INTEGER NOT NULL,
                 vote_count INTEGER NOT NULL
             )",
            [],
        )?;
        Ok(())
    }

    fn table_exists(&self) -> Result<bool, LedgerError> {
        let count: i64 = self.conn.query_row(
            "SELECT count(name) FROM sqlite_master WHERE type = 'table' AND name = 'posts'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// True iff the table is absent or holds no rows. This is the
    /// bootstrap signal for the orchestrator.
    pub fn is_first_cycle(&self) -> Result<bool, LedgerError> {
        if !self.table_exists()? {
            debug!("Posts table does not exist yet");
            return Ok(true);
        }

        let rows: i64 = self
            .conn
            .query_row("SELECT count(date) FROM posts", [], |row| row.get(0))?;
        Ok(rows == 0)
    }

    /// Insert a row for the draft's date, validating required fields
    /// first. Re-inserting the same date overwrites amount and count
    /// but leaves an already-attached media id in place.
    pub fn insert(&self, draft: &PostDraft) -> Result<(), LedgerError> {
        let water_amount = draft
            .water_amount
            .ok_or(LedgerError::Validation("water_amount"))?;
        let vote_count = draft
            .vote_count
            .ok_or(LedgerError::Validation("vote_count"))?;

        self.conn.execute(
            "INSERT INTO posts (date, water_amount, vote_count) VALUES (?1, ?2, ?3)
             ON CONFLICT(date) DO UPDATE SET
                 water_amount = excluded.water_amount,
                 vote_count = excluded.vote_count",
            params![draft.date.to_string(), water_amount, vote_count],
        )?;

        info!(date = %draft.date, water_amount, vote_count, "Ledger row written");
        Ok(())
    }

    /// Attach the external media id to the row for `date`. Silently a
    /// no-op when no row matches.
    pub fn attach_media_id(&self, date: NaiveDate, media_id: &str) -> Result<(), LedgerError> {
        let updated = self.conn.execute(
            "UPDATE posts SET id = ?1 WHERE date = ?2",
            params![media_id, date.to_string()],
        )?;
        debug!(date = %date, updated, "Media id attach");
        Ok(())
    }

    /// Media id for the post on `date`. `Ok(None)` when there is no row
    /// for the date, or the row has no id yet; callers branch on it to
    /// take the default-vote path.
    pub fn get_media_id(&self, date: NaiveDate) -> Result<Option<String>, LedgerError> {
        let id: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT id FROM posts WHERE date = ?1",
                params![date.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.flatten())
    }

    /// Full record for `date`, if one exists.
    pub fn get_record(&self, date: NaiveDate) -> Result<Option<PostRecord>, LedgerError> {
        let record = self
            .conn
            .query_row(
                "SELECT date, id, water_amount, vote_count FROM posts WHERE date = ?1",
                params![date.to_string()],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// All rows in insertion order, for diagnostics.
    pub fn list_all(&self) -> Result<Vec<PostRecord>, LedgerError> {
        let mut stmt = self
            .conn
            .prepare("SELECT date, id, water_amount, vote_count FROM posts ORDER BY rowid")?;
        let rows = stmt.query_map([], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRecord> {
    let date: String = row.get(0)?;
    let date = date.parse::<NaiveDate>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(PostRecord {
        date,
        media_id: row.get(1)?,
        water_amount: row.get(2)?,
        vote_count: row.get(3)?,
    })
}

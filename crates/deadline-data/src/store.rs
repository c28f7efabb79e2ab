//! Persistence of due dates and upload history.
//!
//! [`DueDateStore`] is the seam the ingestion and chart pipelines talk
//! to; [`SqliteStore`] is the embedded implementation. A single handle is
//! opened at startup and passed by reference to every call site.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use deadline_core::error::{DeadlineError, Result};
use deadline_core::models::{DueDateRecord, UploadEvent};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS deadlines (
        id       INTEGER PRIMARY KEY AUTOINCREMENT,
        due_date TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_deadlines_due_date ON deadlines (due_date);
    CREATE TABLE IF NOT EXISTS upload_logs (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        filename    TEXT NOT NULL,
        upload_time TEXT NOT NULL
    );
";

// ── DueDateStore ──────────────────────────────────────────────────────────────

/// Storage operations needed by ingestion and chart rendering.
pub trait DueDateStore {
    /// Append `records`; returns how many rows were written.
    fn insert_due_dates(&self, records: &[DueDateRecord]) -> Result<usize>;

    /// All stored due dates in `[start, end]`, ascending, duplicates kept.
    fn query_due_dates_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>>;

    /// Total number of stored due dates.
    fn count_due_dates(&self) -> Result<u64>;

    fn insert_upload_event(&self, event: &UploadEvent) -> Result<()>;

    /// The most recent upload, if any.
    fn latest_upload_event(&self) -> Result<Option<UploadEvent>>;

    /// The most recent upload under exactly this filename.
    fn latest_upload_named(&self, filename: &str) -> Result<Option<UploadEvent>>;

    /// Whether a file with this exact name was uploaded before.
    fn upload_exists(&self, filename: &str) -> Result<bool>;

    /// Store an upload's records together with its upload event.
    ///
    /// Implementations that support transactions write both or neither.
    fn record_upload(&self, records: &[DueDateRecord], event: &UploadEvent) -> Result<usize> {
        let written = self.insert_due_dates(records)?;
        self.insert_upload_event(event)?;
        Ok(written)
    }
}

// ── SqliteStore ───────────────────────────────────────────────────────────────

/// SQLite-backed [`DueDateStore`].
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(storage_err)?;
        debug!("Opened database {}", path.display());
        Self::with_connection(conn)
    }

    /// A private in-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).map_err(storage_err)?;
        Ok(Self { conn })
    }

    fn insert_due_dates_in(conn: &Connection, records: &[DueDateRecord]) -> Result<usize> {
        let mut stmt = conn
            .prepare_cached("INSERT INTO deadlines (due_date) VALUES (?1)")
            .map_err(storage_err)?;
        for record in records {
            stmt.execute(params![record.due_date]).map_err(storage_err)?;
        }
        Ok(records.len())
    }

    fn insert_upload_event_in(conn: &Connection, event: &UploadEvent) -> Result<()> {
        conn.execute(
            "INSERT INTO upload_logs (filename, upload_time) VALUES (?1, ?2)",
            params![event.filename, format_timestamp(event.uploaded_at)],
        )
        .map_err(storage_err)?;
        Ok(())
    }
}

impl DueDateStore for SqliteStore {
    fn insert_due_dates(&self, records: &[DueDateRecord]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction().map_err(storage_err)?;
        let written = Self::insert_due_dates_in(&tx, records)?;
        tx.commit().map_err(storage_err)?;
        debug!("Inserted {} due dates", written);
        Ok(written)
    }

    fn query_due_dates_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT due_date FROM deadlines
                 WHERE due_date >= ?1 AND due_date <= ?2
                 ORDER BY due_date",
            )
            .map_err(storage_err)?;
        let rows = stmt
            .query_map(params![start, end], |row| row.get::<_, NaiveDate>(0))
            .map_err(storage_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage_err)
    }

    fn count_due_dates(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM deadlines", [], |row| row.get(0))
            .map_err(storage_err)?;
        Ok(count.max(0) as u64)
    }

    fn insert_upload_event(&self, event: &UploadEvent) -> Result<()> {
        Self::insert_upload_event_in(&self.conn, event)
    }

    fn latest_upload_event(&self) -> Result<Option<UploadEvent>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT filename, upload_time FROM upload_logs
                 ORDER BY upload_time DESC, id DESC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(storage_err)?;
        row.map(to_upload_event).transpose()
    }

    fn latest_upload_named(&self, filename: &str) -> Result<Option<UploadEvent>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT filename, upload_time FROM upload_logs
                 WHERE filename = ?1
                 ORDER BY upload_time DESC, id DESC LIMIT 1",
                params![filename],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(storage_err)?;
        row.map(to_upload_event).transpose()
    }

    fn upload_exists(&self, filename: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM upload_logs WHERE filename = ?1",
                params![filename],
                |row| row.get(0),
            )
            .map_err(storage_err)?;
        Ok(count > 0)
    }

    fn record_upload(&self, records: &[DueDateRecord], event: &UploadEvent) -> Result<usize> {
        let tx = self.conn.unchecked_transaction().map_err(storage_err)?;
        let written = Self::insert_due_dates_in(&tx, records)?;
        Self::insert_upload_event_in(&tx, event)?;
        tx.commit().map_err(storage_err)?;
        debug!("Recorded upload '{}' with {} due dates", event.filename, written);
        Ok(written)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn storage_err(e: rusqlite::Error) -> DeadlineError {
    DeadlineError::Storage(e.to_string())
}

fn to_upload_event((filename, upload_time): (String, String)) -> Result<UploadEvent> {
    Ok(UploadEvent {
        filename,
        uploaded_at: parse_timestamp(&upload_time)?,
    })
}

/// Fixed-width UTC RFC 3339, so text order equals time order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DeadlineError::Storage(format!("bad upload_time '{}': {}", s, e)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub mod models;
use models::PollRecord;

/// How many poll-log rows to keep around for the dashboard status line.
const POLL_LOG_KEEP: i64 = 200;

/// Thread-safe SQLite handle (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    // ── Snapshot slot ────────────────────────────────────────────────────────

    /// Replace the snapshot slot wholesale with the raw feed document.
    /// Written only by the poller, and only on a successful fetch; a failed
    /// poll leaves the previous payload in place.
    pub fn store_snapshot(&self, payload: &str, fetched_at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO snapshot (slot, payload, fetched_at) VALUES (1, ?1, ?2)
             ON CONFLICT(slot) DO UPDATE SET
                payload=excluded.payload,
                fetched_at=excluded.fetched_at",
            params![payload, fetched_at],
        )?;
        Ok(())
    }

    /// Read the last stored feed document verbatim, with its fetch time.
    /// `None` means the poller has never succeeded.
    pub fn load_snapshot(&self) -> Result<Option<(String, DateTime<Utc>)>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT payload, fetched_at FROM snapshot WHERE slot = 1",
                [],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, DateTime<Utc>>(1)?)),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(row)
    }

    // ── Poll log ─────────────────────────────────────────────────────────────

    /// Record a poll outcome and prune old rows.
    pub fn log_poll(&self, rec: &PollRecord) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO poll_log (polled_at, ok, live_count, error)
             VALUES (?1, ?2, ?3, ?4)",
            params![rec.polled_at, rec.ok, rec.live_count, rec.error],
        )?;
        let id = conn.last_insert_rowid();
        conn.execute(
            "DELETE FROM poll_log WHERE id NOT IN
               (SELECT id FROM poll_log ORDER BY id DESC LIMIT ?1)",
            params![POLL_LOG_KEEP],
        )?;
        Ok(id)
    }

    /// List the most recent poll outcomes, newest first.
    pub fn recent_polls(&self, limit: i64) -> Result<Vec<PollRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, polled_at, ok, live_count, error
             FROM poll_log ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], map_poll_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

fn map_poll_record(row: &rusqlite::Row) -> rusqlite::Result<PollRecord> {
    Ok(PollRecord {
        id: row.get(0)?,
        polled_at: row.get(1)?,
        ok: row.get(2)?,
        live_count: row.get(3)?,
        error: row.get(4)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS snapshot (
    slot       INTEGER PRIMARY KEY CHECK (slot = 1),
    payload    TEXT    NOT NULL,
    fetched_at TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS poll_log (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    polled_at  TEXT    NOT NULL,
    ok         INTEGER NOT NULL,
    live_count INTEGER,
    error      TEXT
);
"#;

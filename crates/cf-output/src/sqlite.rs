//! SQLite output backend (feature `sqlite`).
//!
//! Creates (or appends to) a single `event_log` table.  Rows are buffered
//! and inserted in one transaction per batch.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{EventRow, OutputResult};

const BATCH: usize = 1024;

/// Writes the event log to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    pending:  Vec<EventRow>,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn open(path: &Path) -> OutputResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS event_log (
                 time            TEXT    NOT NULL,
                 time_ns         INTEGER NOT NULL,
                 component       TEXT    NOT NULL,
                 port            TEXT    NOT NULL,
                 patient_id      INTEGER NOT NULL,
                 age             INTEGER NOT NULL,
                 risk            TEXT    NOT NULL,
                 status          TEXT    NOT NULL,
                 arrival         TEXT    NOT NULL,
                 attention_start TEXT    NOT NULL,
                 attention_end   TEXT    NOT NULL,
                 waiting         TEXT    NOT NULL,
                 service         TEXT    NOT NULL,
                 server          INTEGER NOT NULL,
                 outcome         TEXT    NOT NULL,
                 followups       INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, pending: Vec::with_capacity(BATCH), finished: false })
    }

    fn flush_pending(&mut self) -> OutputResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO event_log \
                 (time, time_ns, component, port, patient_id, age, risk, status, arrival, \
                  attention_start, attention_end, waiting, service, server, outcome, followups) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            )?;
            for row in &self.pending {
                let p = &row.patient;
                // INTEGER is signed 64-bit; the infinity sentinel is stored as -1.
                let time_ns = i64::try_from(row.time.0).unwrap_or(-1);
                stmt.execute(rusqlite::params![
                    row.time.to_string(),
                    time_ns,
                    row.component,
                    row.port,
                    p.id.0,
                    p.age,
                    p.risk.as_str(),
                    p.status.as_str(),
                    p.arrival.to_string(),
                    p.attention_start.to_string(),
                    p.attention_end.to_string(),
                    p.waiting.to_string(),
                    p.service.to_string(),
                    row.server(),
                    p.outcome.as_str(),
                    p.followups_done,
                ])?;
            }
        }
        tx.commit()?;
        self.pending.clear();
        Ok(())
    }
}

impl OutputWriter for SqliteWriter {
    fn write_event(&mut self, row: &EventRow) -> OutputResult<()> {
        self.pending.push(row.clone());
        if self.pending.len() >= BATCH {
            self.flush_pending()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.flush_pending()?;
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}

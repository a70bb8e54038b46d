//! SQLite log store
//!
//! The executor and CLI emit `(message, tag, transform_name)` triples; this
//! store persists them per session so runs can be inspected after the fact
//! with `clipchain log`. Writes go through a dedicated writer thread so the
//! pipeline path never blocks on disk; queries open their own short-lived
//! connections.
//!
//! Schema:
//!   sessions(id, started_at, transforms_folder)
//!   log_entries(id, session_id, timestamp, tag, message, transform_name)
//!
//! Entries older than the retention window are purged at startup.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Local};
use rusqlite::{params, Connection};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown log tag: {0}")]
    UnknownTag(String),
}

/// Category of a log line, mirrored in the terminal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    Info,
    Ok,
    Warn,
    Err,
    Chain,
    Preview,
}

impl LogTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::Info => "info",
            LogTag::Ok => "ok",
            LogTag::Warn => "warn",
            LogTag::Err => "err",
            LogTag::Chain => "chain",
            LogTag::Preview => "preview",
        }
    }
}

impl fmt::Display for LogTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogTag {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, LogError> {
        match s {
            "info" => Ok(LogTag::Info),
            "ok" => Ok(LogTag::Ok),
            "warn" => Ok(LogTag::Warn),
            "err" => Ok(LogTag::Err),
            "chain" => Ok(LogTag::Chain),
            "preview" => Ok(LogTag::Preview),
            other => Err(LogError::UnknownTag(other.to_string())),
        }
    }
}

/// A stored log line.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub session_id: String,
    pub timestamp: String,
    pub tag: String,
    pub message: String,
    pub transform_name: String,
}

/// One recorded application session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRow {
    pub id: String,
    pub started_at: String,
    pub transforms_folder: String,
}

/// Filter for [`LogStore::entries`].
#[derive(Debug, Default, Clone)]
pub struct EntryFilter {
    pub session_id: Option<String>,
    pub tag: Option<LogTag>,
    pub limit: usize,
}

struct Record {
    timestamp: String,
    tag: &'static str,
    message: String,
    transform_name: String,
}

/// Session-scoped log sink backed by SQLite.
pub struct LogStore {
    db_path: PathBuf,
    session_id: String,
    tx: Option<Sender<Record>>,
    writer: Option<JoinHandle<()>>,
}

impl LogStore {
    /// Opens (creating if needed) the log database, registers a new session,
    /// purges expired entries, and starts the writer thread.
    pub fn open(db_path: &Path, transforms_folder: &str, retain_days: u32) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create log directory: {}", parent.display())
            })?;
        }

        let session_id = new_session_id();
        let started_at = Local::now().to_rfc3339();

        let conn = connect(db_path)?;
        init_schema(&conn)?;
        conn.execute(
            "INSERT INTO sessions(id, started_at, transforms_folder) VALUES(?1, ?2, ?3)",
            params![session_id, started_at, transforms_folder],
        )?;
        purge_old(&conn, retain_days)?;
        drop(conn);

        let (tx, rx) = mpsc::channel::<Record>();
        let writer_path = db_path.to_path_buf();
        let writer_session = session_id.clone();
        let writer = std::thread::spawn(move || {
            let Ok(conn) = connect(&writer_path) else {
                return;
            };
            while let Ok(record) = rx.recv() {
                // A failed insert drops the line; logging must never take
                // the pipeline down.
                let _ = conn.execute(
                    "INSERT INTO log_entries(session_id, timestamp, tag, message, transform_name) \
                     VALUES(?1, ?2, ?3, ?4, ?5)",
                    params![
                        writer_session,
                        record.timestamp,
                        record.tag,
                        record.message,
                        record.transform_name
                    ],
                );
            }
        });

        Ok(Self {
            db_path: db_path.to_path_buf(),
            session_id,
            tx: Some(tx),
            writer: Some(writer),
        })
    }

    /// Opens the database for inspection only: no session row, no writer
    /// thread. [`LogStore::log`] becomes a no-op on the returned store.
    pub fn open_read(db_path: &Path) -> Result<Self> {
        let conn = connect(db_path)?;
        init_schema(&conn)?;
        drop(conn);
        Ok(Self {
            db_path: db_path.to_path_buf(),
            session_id: String::new(),
            tx: None,
            writer: None,
        })
    }

    /// Queues one log line for the current session.
    pub fn log(&self, message: &str, tag: LogTag, transform_name: &str) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Record {
                timestamp: Local::now().to_rfc3339(),
                tag: tag.as_str(),
                message: message.to_string(),
                transform_name: transform_name.to_string(),
            });
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Fetches stored entries, oldest first within the window.
    pub fn entries(&self, filter: &EntryFilter) -> Result<Vec<LogEntry>, LogError> {
        let conn = connect(&self.db_path)?;
        let mut clauses = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(session) = &filter.session_id {
            clauses.push("session_id = ?");
            args.push(session.clone());
        }
        if let Some(tag) = filter.tag {
            clauses.push("tag = ?");
            args.push(tag.as_str().to_string());
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let limit = if filter.limit == 0 { 500 } else { filter.limit };
        let sql = format!(
            "SELECT id, session_id, timestamp, tag, message, transform_name \
             FROM log_entries {} ORDER BY id DESC LIMIT {}",
            where_sql, limit
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut rows: Vec<LogEntry> = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), |row| {
                Ok(LogEntry {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    timestamp: row.get(2)?,
                    tag: row.get(3)?,
                    message: row.get(4)?,
                    transform_name: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<_, _>>()?;
        rows.reverse();
        Ok(rows)
    }

    /// Lists recorded sessions, newest first.
    pub fn sessions(&self, limit: usize) -> Result<Vec<SessionRow>, LogError> {
        let conn = connect(&self.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT id, started_at, transforms_folder FROM sessions \
             ORDER BY started_at DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(SessionRow {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    transforms_folder: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(rows)
    }

    /// Drains the queue and stops the writer thread.
    pub fn close(&mut self) {
        self.tx.take();
        if let Some(writer) = self.writer.take() {
            let _ = writer.join();
        }
    }
}

impl Drop for LogStore {
    fn drop(&mut self) {
        self.close();
    }
}

fn connect(db_path: &Path) -> Result<Connection, LogError> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<(), LogError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS sessions (
            id                TEXT PRIMARY KEY,
            started_at        TEXT NOT NULL,
            transforms_folder TEXT
        );
        CREATE TABLE IF NOT EXISTS log_entries (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id     TEXT NOT NULL,
            timestamp      TEXT NOT NULL,
            tag            TEXT NOT NULL,
            message        TEXT NOT NULL,
            transform_name TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_log_ts ON log_entries(timestamp);
        CREATE INDEX IF NOT EXISTS idx_log_session ON log_entries(session_id);
        CREATE INDEX IF NOT EXISTS idx_log_tag ON log_entries(tag);
        ",
    )?;
    Ok(())
}

fn purge_old(conn: &Connection, retain_days: u32) -> Result<(), LogError> {
    let cutoff = (Local::now() - ChronoDuration::days(retain_days as i64)).to_rfc3339();
    conn.execute("DELETE FROM log_entries WHERE timestamp < ?1", params![cutoff])?;
    conn.execute(
        "DELETE FROM sessions WHERE started_at < ?1 \
         AND id NOT IN (SELECT DISTINCT session_id FROM log_entries)",
        params![cutoff],
    )?;
    Ok(())
}

/// Short hash session id: start time + pid, first 8 hex chars.
fn new_session_id() -> String {
    let nanos = Local::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    let input = format!("{}:{}", nanos, std::process::id());
    let hash = blake3::hash(input.as_bytes());
    hash.to_hex()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> LogStore {
        LogStore::open(&dir.path().join("log.db"), "/tmp/transforms", 30).unwrap()
    }

    #[test]
    fn logged_entries_come_back_in_order() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.log("first", LogTag::Info, "");
        store.log("second", LogTag::Ok, "upper");
        store.close();

        let entries = store.entries(&EntryFilter::default()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].message, "second");
        assert_eq!(entries[1].transform_name, "upper");
    }

    #[test]
    fn tag_filter_applies() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.log("a", LogTag::Info, "");
        store.log("b", LogTag::Err, "");
        store.close();

        let errs = store
            .entries(&EntryFilter {
                tag: Some(LogTag::Err),
                ..EntryFilter::default()
            })
            .unwrap();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].message, "b");
    }

    #[test]
    fn sessions_are_recorded() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let sessions = store.sessions(10).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, store.session_id());
        assert_eq!(sessions[0].transforms_folder, "/tmp/transforms");
    }

    #[test]
    fn two_stores_get_distinct_sessions() {
        let dir = TempDir::new().unwrap();
        let first = open_store(&dir);
        let second = open_store(&dir);
        assert_ne!(first.session_id(), second.session_id());
    }

    #[test]
    fn tag_parsing_round_trips() {
        for tag in [
            LogTag::Info,
            LogTag::Ok,
            LogTag::Warn,
            LogTag::Err,
            LogTag::Chain,
            LogTag::Preview,
        ] {
            assert_eq!(tag.as_str().parse::<LogTag>().unwrap(), tag);
        }
        assert!("nope".parse::<LogTag>().is_err());
    }
}

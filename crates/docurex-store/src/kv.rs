// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Key-value backends.
//
// Schema (SQLite):
//   kv(
//     key        TEXT PRIMARY KEY,   -- e.g. "docurex_users"
//     value      TEXT NOT NULL,      -- UTF-8 JSON
//     updated_at TEXT NOT NULL       -- RFC 3339
//   )

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use docurex_core::error::{DocurexError, Result};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument, warn};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS kv (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

/// Convert a `rusqlite::Error` into a `DocurexError::Database` with context.
fn db_err(context: &'static str) -> impl Fn(rusqlite::Error) -> DocurexError {
    move |e| DocurexError::Database(format!("{context}: {e}"))
}

/// A durable string-keyed store of JSON documents.
///
/// `modify` is the only write path the collections use: it reads the current
/// value, hands it to the closure, and stores the result without letting
/// another writer interleave between the read and the write.
pub trait KvBackend: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    fn modify(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()>;
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

/// Key-value store backed by a single SQLite table.
///
/// Read-modify-write runs inside `BEGIN IMMEDIATE`, so two processes sharing
/// the same database file cannot lose each other's appends.
pub struct SqliteKv {
    conn: Connection,
}

impl SqliteKv {
    /// Open (or create) the store at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err("open"))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err("WAL pragma"))?;
        // Another process holding the write lock is waited on, not failed.
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(db_err("busy timeout"))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(db_err("create table"))?;

        info!("key-value store opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err("open in-memory"))?;
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(db_err("create table"))?;

        debug!("in-memory key-value store opened");
        Ok(Self { conn })
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(db_err("read"))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(db_err("write"))?;
        Ok(())
    }
}

impl KvBackend for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.read(key)
    }

    #[instrument(skip(self, value), fields(len = value.len()))]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.write(key, value)?;
        debug!("value stored");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(db_err("delete"))?;
        Ok(())
    }

    #[instrument(skip(self, f))]
    fn modify(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()> {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(db_err("begin"))?;

        let result = self
            .read(key)
            .and_then(|current| f(current))
            .and_then(|next| self.write(key, &next));

        match result {
            Ok(()) => {
                self.conn.execute_batch("COMMIT").map_err(db_err("commit"))?;
                debug!("value modified");
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local store.  Nothing survives a restart.
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().expect("kv lock poisoned");
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().expect("kv lock poisoned");
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().expect("kv lock poisoned");
        entries.remove(key);
        Ok(())
    }

    fn modify(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()> {
        let mut entries = self.entries.lock().expect("kv lock poisoned");
        let next = f(entries.get(key).cloned())?;
        entries.insert(key.to_owned(), next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backends() -> Vec<Box<dyn KvBackend>> {
        vec![
            Box::new(SqliteKv::open_in_memory().expect("open in-memory db")),
            Box::new(MemoryKv::new()),
        ]
    }

    #[test]
    fn set_get_remove() {
        for kv in backends() {
            assert!(kv.get("k").unwrap().is_none());
            kv.set("k", "[1]").unwrap();
            assert_eq!(kv.get("k").unwrap().as_deref(), Some("[1]"));
            kv.set("k", "[1,2]").unwrap();
            assert_eq!(kv.get("k").unwrap().as_deref(), Some("[1,2]"));
            kv.remove("k").unwrap();
            assert!(kv.get("k").unwrap().is_none());
        }
    }

    #[test]
    fn modify_sees_current_value() {
        for kv in backends() {
            kv.set("k", "a").unwrap();
            kv.modify("k", &mut |cur| Ok(format!("{}b", cur.unwrap_or_default())))
                .unwrap();
            assert_eq!(kv.get("k").unwrap().as_deref(), Some("ab"));
        }
    }

    #[test]
    fn failed_modify_leaves_value_untouched() {
        for kv in backends() {
            kv.set("k", "original").unwrap();
            let result = kv.modify("k", &mut |_| Err(DocurexError::Database("boom".into())));
            assert!(result.is_err());
            assert_eq!(kv.get("k").unwrap().as_deref(), Some("original"));
        }
    }

    #[test]
    fn sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.db");
        {
            let kv = SqliteKv::open(&path).expect("open");
            kv.set("docurex_users", "[]").unwrap();
        }
        let kv = SqliteKv::open(&path).expect("reopen");
        assert_eq!(kv.get("docurex_users").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn two_handles_on_one_file_do_not_lose_appends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("shared.db");
        let a = SqliteKv::open(&path).expect("open a");
        let b = SqliteKv::open(&path).expect("open b");
        a.set("n", "0").unwrap();

        for i in 0..10 {
            let kv = if i % 2 == 0 { &a } else { &b };
            kv.modify("n", &mut |cur| {
                let n: u32 = cur.unwrap_or_default().parse().unwrap_or(0);
                Ok((n + 1).to_string())
            })
            .unwrap();
        }

        assert_eq!(a.get("n").unwrap().as_deref(), Some("10"));
    }
}

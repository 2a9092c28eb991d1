//! sqlite-adapter — SQLite implementation of the KeyValueStore port.
//!
//! Purpose
//! - Give the planet store durable on-device storage without a platform
//!   key-value engine.
//! - Implements the `KeyValueStore` trait from the `domain` crate as a single
//!   `kv(key, value)` table; `set` is an upsert that replaces the whole value.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.

use std::path::Path;
use std::sync::Mutex;

use domain::{CoreError, KeyValueStore};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

/// SQLite-backed key-value store.
pub struct SqliteKv {
    conn: Mutex<Connection>,
}

impl SqliteKv {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(map_ioerr)?;
            }
        }
        let conn = Connection::open(path).map_err(map_sqerr)?;
        init_schema(&conn)?;
        debug!(path = %path.display(), "opened sqlite key-value store");
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Non-persistent database, mainly for tests.
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(map_sqerr)?;
        init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .map_err(map_sqerr)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CoreError { CoreError::StorageRead(format!("sqlite error: {e}")) }
fn map_write<E: std::fmt::Display>(e: E) -> CoreError { CoreError::StorageWrite(format!("sqlite error: {e}")) }
fn map_ioerr(e: std::io::Error) -> CoreError { CoreError::StorageRead(format!("io error: {e}")) }

impl KeyValueStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let conn = self.conn.lock().map_err(|_| CoreError::StorageRead("mutex poisoned".into()))?;
        conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(map_sqerr)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let conn = self.conn.lock().map_err(|_| CoreError::StorageWrite("mutex poisoned".into()))?;
        conn.execute(
            "INSERT INTO kv(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(map_write)?;
        Ok(())
    }
}

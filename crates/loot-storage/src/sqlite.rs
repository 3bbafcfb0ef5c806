use crate::kv::KvStore;
use crate::StorageError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

pub const KV_SCHEMA_VERSION: i64 = 1;

/// Key-value store kept in a single SQLite table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn schema_version(&self) -> Result<i64, StorageError> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    pub fn migrate(&self) -> Result<(), StorageError> {
        let current = self.schema_version()?;
        if current > KV_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedSchemaVersion {
                found: current,
                supported: KV_SCHEMA_VERSION,
            });
        }

        if current < 1 {
            let sql = include_str!("../migrations/0001_kv_schema.sql");
            self.conn.execute_batch(sql)?;
            self.conn
                .execute("PRAGMA user_version = 1", [])
                .map(|_| ())?;
        }

        Ok(())
    }

    /// When `key` was last written, as RFC 3339.
    pub fn updated_at(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .conn
            .query_row("SELECT updated_at FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?)
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value=excluded.value,
                updated_at=excluded.updated_at
            ",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

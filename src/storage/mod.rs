//! Local record store
//!
//! A small key/value store holding the client's persistent records (API key,
//! settings, chat list). Values are opaque strings; callers serialize their
//! own records. There is one writer and no concurrent access, so every
//! operation opens the database, does its work, and closes it again.

use crate::error::{ChatError, Result};
use anyhow::Context;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub mod history;
pub use history::{ChatHistory, MAX_HISTORY};

/// Environment variable overriding the default store location
pub const STORE_PATH_ENV: &str = "QUILLCHAT_STORE";

/// Persistent string records addressed by key
pub trait RecordStore: Send + Sync {
    /// Read a record, `None` when it was never written or has been removed
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Create or replace a record
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a record; removing a missing record is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed record store
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open the store at its default location
    ///
    /// Honors [`STORE_PATH_ENV`]; otherwise uses `store.db` in the user's
    /// data directory.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var(STORE_PATH_ENV) {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "quillchat", "quillchat")
            .ok_or_else(|| ChatError::Storage("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join("store.db"))
    }

    /// Open the store at a specific path, creating parent directories
    ///
    /// # Examples
    ///
    /// ```
    /// use quillchat::storage::{RecordStore, SqliteStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteStore::new_with_path(dir.path().join("store.db")).unwrap();
    /// store.set("greeting", "hello").unwrap();
    /// assert_eq!(store.get("greeting").unwrap().as_deref(), Some("hello"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| ChatError::Storage(e.to_string()))?;
        }

        let store = Self { db_path };
        store.init()?;
        tracing::debug!("Opened record store at {}", store.db_path.display());
        Ok(store)
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        Ok(Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| ChatError::Storage(e.to_string()))?)
    }

    fn init(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| ChatError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl RecordStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        let value = conn
            .query_row(
                "SELECT value FROM records WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query record")
            .map_err(|e| ChatError::Storage(e.to_string()))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO records (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .context("Failed to write record")
        .map_err(|e| ChatError::Storage(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute("DELETE FROM records WHERE key = ?", params![key])
            .context("Failed to delete record")
            .map_err(|e| ChatError::Storage(e.to_string()))?;
        Ok(())
    }
}

/// In-memory record store, used with `--ephemeral` and in tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        Ok(self
            .records
            .lock()
            .map_err(|_| ChatError::Storage("memory store lock poisoned".into()))?)
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::tempdir;

    fn create_test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempdir().expect("failed to create tempdir");
        let store = SqliteStore::new_with_path(dir.path().join("store.db"))
            .expect("failed to create store");
        (store, dir)
    }

    #[test]
    fn test_init_creates_table() {
        let (store, _dir) = create_test_store();
        let conn = Connection::open(store.path()).expect("open connection");
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='records'",
                [],
                |r| r.get(0),
            )
            .expect("query row");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let (store, _dir) = create_test_store();
        assert!(store.get("nothing").expect("get failed").is_none());
    }

    #[test]
    fn test_set_replaces_existing_value() {
        let (store, _dir) = create_test_store();
        store.set("k", "one").expect("first set failed");
        store.set("k", "two").expect("second set failed");
        assert_eq!(store.get("k").expect("get failed").as_deref(), Some("two"));
    }

    #[test]
    fn test_records_are_independent() {
        let (store, _dir) = create_test_store();
        store.set("api_key", "secret").unwrap();
        store.set("settings", "{}").unwrap();
        store.remove("api_key").unwrap();
        assert!(store.get("api_key").unwrap().is_none());
        assert_eq!(store.get("settings").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (store, _dir) = create_test_store();
        store.remove("never-written").expect("first remove failed");
        store.remove("never-written").expect("second remove failed");
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.db");
        SqliteStore::new_with_path(&path)
            .unwrap()
            .set("k", "persisted")
            .unwrap();
        let reopened = SqliteStore::new_with_path(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_memory_store_behaves_like_sqlite() {
        let store = MemoryStore::new();
        assert!(store.get("k").unwrap().is_none());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    #[serial]
    fn test_new_respects_env_override() {
        let dir = tempdir().expect("failed to create tempdir");
        let db_path = dir.path().join("nested").join("store.db");
        env::set_var(STORE_PATH_ENV, db_path.to_string_lossy().to_string());

        let store = SqliteStore::new().expect("new failed with env override");
        assert_eq!(store.path(), db_path.as_path());
        assert!(db_path.parent().unwrap().exists());

        env::remove_var(STORE_PATH_ENV);
    }
}

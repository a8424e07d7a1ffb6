//! DuckDB-backed key-value store
//!
//! Durable stand-in for browser local storage: one `kv_store` table in a
//! DuckDB file inside the data directory.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use duckdb::{params, Connection};
use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::migrations::STORE_MIGRATIONS;
use crate::ports::KeyValueStore;
use crate::services::MigrationService;

/// Maximum number of attempts when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// Key-value store persisted in a DuckDB file
pub struct DuckDbStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbStore {
    /// Open (or create) the store at `db_path` and apply pending migrations.
    ///
    /// Retries with exponential backoff while another process holds the file.
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    let store = Self {
                        conn: Mutex::new(conn),
                        db_path: Some(db_path.to_path_buf()),
                    };
                    store.ensure_schema()?;
                    return Ok(store);
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        warn!(
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            delay_ms = delay.as_millis() as u64,
                            "store database busy, retrying: {}",
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open store after {} retries", MAX_RETRIES)))
    }

    /// Store that lives only as long as the process
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            db_path: None,
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn try_open_connection(db_path: &Path) -> anyhow::Result<Connection> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)?;
        Ok(conn)
    }

    fn ensure_schema(&self) -> anyhow::Result<()> {
        let conn = self.lock().map_err(|e| anyhow!(e.to_string()))?;
        let result = MigrationService::new(&conn, STORE_MIGRATIONS).run_pending()?;
        if !result.applied.is_empty() {
            debug!(applied = ?result.applied, "store migrations applied");
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Path of the backing file, `None` for in-memory stores
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// All keys starting with `prefix`, sorted
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT key FROM kv_store WHERE starts_with(key, ?) ORDER BY key")
            .map_err(|e| Error::database(e.to_string()))?;
        let keys = stmt
            .query_map([prefix], |row| row.get::<_, String>(0))
            .map_err(|e| Error::database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(keys)
    }
}

impl KeyValueStore for DuckDbStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        match conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?",
            [key],
            |row| row.get::<_, String>(0),
        ) {
            Ok(value) => Ok(Some(value)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::database(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)",
            params![key, value],
        )
        .map_err(|e| Error::persistence(key, e))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?", [key])
            .map_err(|e| Error::persistence(key, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_get_remove() {
        let store = DuckDbStore::open_in_memory().unwrap();
        assert_eq!(store.get("trialRemainingSaves").unwrap(), None);

        store.set("trialRemainingSaves", "3").unwrap();
        store.set("trialRemainingSaves", "2").unwrap();
        assert_eq!(store.get("trialRemainingSaves").unwrap().as_deref(), Some("2"));

        store.remove("trialRemainingSaves").unwrap();
        store.remove("trialRemainingSaves").unwrap();
        assert_eq!(store.get("trialRemainingSaves").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.duckdb");
        {
            let store = DuckDbStore::open(&path).unwrap();
            store.set("savedItems:u1", r#"["a"]"#).unwrap();
        }
        let store = DuckDbStore::open(&path).unwrap();
        assert_eq!(store.get("savedItems:u1").unwrap().as_deref(), Some(r#"["a"]"#));
        assert_eq!(store.db_path(), Some(path.as_path()));
    }

    #[test]
    fn test_keys_with_prefix() {
        let store = DuckDbStore::open_in_memory().unwrap();
        store.set("savedItems:b", "[]").unwrap();
        store.set("savedItems:a", "[]").unwrap();
        store.set("userTier", "premium").unwrap();

        assert_eq!(
            store.keys_with_prefix("savedItems:").unwrap(),
            vec!["savedItems:a".to_string(), "savedItems:b".to_string()]
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable_error("IO Error: database is locked"));
        assert!(!is_retryable_error("Catalog Error: table missing"));
    }
}

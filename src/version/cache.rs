//! SQLite-backed key/value preferences
//!
//! The engine treats persisted state as externally synchronized storage: every
//! single read or write is atomic, multi-key removals run in one transaction.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::{debug, error, info};

use crate::version::error::StoreError;

/// Narrow persistence abstraction over atomic string entries
pub trait PreferenceStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove all `keys` atomically
    fn remove(&self, keys: &[&str]) -> Result<(), StoreError>;
}

/// Epoch millis, the unit of every persisted timestamp
pub(crate) fn current_timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        info!("Initializing preferences database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // several processes of the family may share one file
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        debug!("Preferences database ready");
        Ok(store)
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(())
    }
}

impl PreferenceStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock_conn()?;
        let result = conn.query_row(
            "SELECT value FROM preferences WHERE key = ?1",
            [key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO preferences (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            (key, value),
        )?;
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM preferences WHERE key = ?1")?;
            for key in keys {
                stmt.execute([key])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// Typed accessors over a [`PreferenceStore`].
///
/// Store failures are logged and degrade to defaults: reads return `None`
/// (or `false`), writes are dropped.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn PreferenceStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.store
            .get(key)
            .inspect_err(|e| error!("Failed to read preference {}: {}", key, e))
            .ok()
            .flatten()
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get_string(key)?.parse().ok()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get_string(key).is_some_and(|value| value == "true")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get_string(key).is_some()
    }

    pub fn put_string(&self, key: &str, value: &str) {
        let _ = self
            .store
            .put(key, value)
            .inspect_err(|e| error!("Failed to write preference {}: {}", key, e));
    }

    pub fn put_i64(&self, key: &str, value: i64) {
        self.put_string(key, &value.to_string());
    }

    pub fn put_bool(&self, key: &str, value: bool) {
        self.put_string(key, if value { "true" } else { "false" });
    }

    pub fn remove(&self, keys: &[&str]) {
        let _ = self
            .store
            .remove(keys)
            .inspect_err(|e| error!("Failed to remove preferences {:?}: {}", keys, e));
    }
}

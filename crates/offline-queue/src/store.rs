//! Persistent queue store: SQLite-backed two-key KV storage.
//!
//! The layout mirrors the original persisted form: one key holds the
//! JSON-serialized ordered operation list, a second key holds sync metadata.
//! Keys carry a version suffix; a schema change requires a new key name.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::warn;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;
use crate::types::{QueuedOperation, SyncMeta};

const QUEUE_KEY: &str = "offline.queue.v1";
const META_KEY: &str = "offline.meta.v1";

/// Durable storage for the ordered operation list and sync metadata.
///
/// Missing or corrupt payloads load as empty rather than erroring; only
/// storage-medium failures surface, and callers treat those as best-effort.
/// No network access, no side effects beyond the database file.
pub struct QueueStore {
    conn: Mutex<Connection>,
}

impl QueueStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory store; state lives only as long as the instance.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_key(conn: &Connection, key: &str) -> Result<Option<String>, StoreError> {
        Ok(conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?)
    }

    fn write_key(conn: &Connection, key: &str, value: &str) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn load_operations(conn: &Connection) -> Result<Vec<QueuedOperation>, StoreError> {
        let Some(raw) = Self::read_key(conn, QUEUE_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(operations) => Ok(operations),
            Err(err) => {
                warn!("discarding corrupt queue payload: {err}");
                Ok(Vec::new())
            }
        }
    }

    fn save_operations(
        conn: &Connection,
        operations: &[QueuedOperation],
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_string(operations)?;
        Self::write_key(conn, QUEUE_KEY, &payload)
    }

    /// Load the ordered pending operations.
    pub fn load(&self) -> Result<Vec<QueuedOperation>, StoreError> {
        Self::load_operations(&self.lock())
    }

    /// Overwrite the stored sequence.
    pub fn save(&self, operations: &[QueuedOperation]) -> Result<(), StoreError> {
        Self::save_operations(&self.lock(), operations)
    }

    /// Append one operation to the tail.
    ///
    /// The read-modify-write runs under the store's lock so an enqueue during
    /// a drain pass cannot lose either side's update.
    pub fn append(&self, operation: QueuedOperation) -> Result<(), StoreError> {
        let conn = self.lock();
        let mut operations = Self::load_operations(&conn)?;
        operations.push(operation);
        Self::save_operations(&conn, &operations)
    }

    /// Remove the head operation if it still carries the given id.
    pub fn remove_first(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.lock();
        let mut operations = Self::load_operations(&conn)?;
        if operations.first().map(|op| op.id.as_str()) == Some(id) {
            operations.remove(0);
            Self::save_operations(&conn, &operations)?;
        }
        Ok(())
    }

    pub fn load_meta(&self) -> Result<SyncMeta, StoreError> {
        let conn = self.lock();
        let Some(raw) = Self::read_key(&conn, META_KEY)? else {
            return Ok(SyncMeta::default());
        };
        match serde_json::from_str(&raw) {
            Ok(meta) => Ok(meta),
            Err(err) => {
                warn!("discarding corrupt sync metadata: {err}");
                Ok(SyncMeta::default())
            }
        }
    }

    pub fn save_meta(&self, meta: SyncMeta) -> Result<(), StoreError> {
        let conn = self.lock();
        let payload = serde_json::to_string(&meta)?;
        Self::write_key(&conn, META_KEY, &payload)
    }

    #[cfg(test)]
    fn write_raw(&self, key: &str, value: &str) {
        Self::write_key(&self.lock(), key, value).expect("raw write");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{WriteMethod, WriteRequest};
    use serde_json::json;

    fn operation(url: &str, at: i64) -> QueuedOperation {
        WriteRequest::json(WriteMethod::Post, url, json!({"n": at})).into_operation(at)
    }

    #[test]
    fn empty_store_loads_empty_queue_and_default_meta() {
        let store = QueueStore::open_in_memory().expect("open store");
        assert!(store.load().expect("load").is_empty());
        assert_eq!(store.load_meta().expect("meta"), SyncMeta::default());
    }

    #[test]
    fn save_then_load_preserves_order() {
        let store = QueueStore::open_in_memory().expect("open store");
        let operations = vec![operation("/api/a", 1), operation("/api/b", 2)];
        store.save(&operations).expect("save");
        let loaded = store.load().expect("load");
        assert_eq!(loaded, operations);
    }

    #[test]
    fn corrupt_queue_payload_loads_as_empty() {
        let store = QueueStore::open_in_memory().expect("open store");
        store.write_raw(QUEUE_KEY, "not json {{");
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn corrupt_meta_loads_as_default() {
        let store = QueueStore::open_in_memory().expect("open store");
        store.write_raw(META_KEY, "]");
        assert_eq!(store.load_meta().expect("meta"), SyncMeta::default());
    }

    #[test]
    fn append_keeps_fifo_order() {
        let store = QueueStore::open_in_memory().expect("open store");
        store.append(operation("/api/a", 1)).expect("append");
        store.append(operation("/api/b", 2)).expect("append");
        let urls: Vec<String> = store
            .load()
            .expect("load")
            .into_iter()
            .map(|op| op.url)
            .collect();
        assert_eq!(urls, vec!["/api/a", "/api/b"]);
    }

    #[test]
    fn remove_first_only_removes_the_matching_head() {
        let store = QueueStore::open_in_memory().expect("open store");
        let first = operation("/api/a", 1);
        let second = operation("/api/b", 2);
        store.append(first.clone()).expect("append");
        store.append(second.clone()).expect("append");

        // Wrong id leaves the queue untouched.
        store.remove_first(&second.id).expect("remove_first");
        assert_eq!(store.load().expect("load").len(), 2);

        store.remove_first(&first.id).expect("remove_first");
        let remaining = store.load().expect("load");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second.id);
    }

    #[test]
    fn meta_round_trips() {
        let store = QueueStore::open_in_memory().expect("open store");
        store
            .save_meta(SyncMeta {
                last_sync_at: Some(1_700_000_000_000),
            })
            .expect("save meta");
        assert_eq!(
            store.load_meta().expect("meta").last_sync_at,
            Some(1_700_000_000_000)
        );
    }

    #[test]
    fn queue_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("queue.db");

        {
            let store = QueueStore::open(&path).expect("open store");
            store.append(operation("/api/a", 1)).expect("append");
            store
                .save_meta(SyncMeta {
                    last_sync_at: Some(42),
                })
                .expect("save meta");
        }

        let reopened = QueueStore::open(&path).expect("reopen store");
        let loaded = reopened.load().expect("load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].url, "/api/a");
        assert_eq!(reopened.load_meta().expect("meta").last_sync_at, Some(42));
    }
}

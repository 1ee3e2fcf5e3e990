//! Local persistence store
//!
//! Keeps the whole [`LocalDb`] as one serialized document under a fixed key.
//! Reads never fail: an empty, unreadable or structurally invalid document
//! yields the seed document instead. A malformed row is skipped on its own
//! and the rest of its collection is kept. Writes fail softly and only
//! leave a diagnostic behind.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde_json::Value;

use tracing::{debug, error, info, warn};

use crate::data::LocalDb;
use crate::error::{DocumentError, StorageError};
use crate::fallback::seed_db;
use crate::helpers::{read_data, remove_data, write_data};

pub const STORAGE_KEY: &str = "phillips_db";

const COLLECTIONS: [&str; 3] = ["programs", "program_registrations", "enrollments"];

/// Key-value storage the document is kept in.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        read_data(&self.path(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        write_data(&self.path(key), value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        remove_data(&self.path(key))
    }
}

/// In-process storage with an optional byte quota over all keys and values.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota: Some(quota),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries();

        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| existing.len() + stored.len())
                .sum();
            let needed = others + key.len() + value.len();

            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        entries.insert(key.to_owned(), value.to_owned());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Persisted,
    /// No storage is available; nothing was attempted.
    Skipped,
    /// The backend refused the write; the data only lives in the caller.
    Dropped,
}

#[derive(Clone)]
pub struct LocalStore {
    backend: Option<Arc<dyn StorageBackend>>,
    key: String,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl LocalStore {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Some(Arc::new(backend)),
            key: STORAGE_KEY.to_owned(),
            lock: Arc::default(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// A store for environments without persistent storage. Reads return
    /// the seed document and every mutation is a no-op.
    pub fn unavailable() -> Self {
        Self {
            backend: None,
            key: STORAGE_KEY.to_owned(),
            lock: Arc::default(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Writes the seed document if nothing is stored yet. Safe to call any
    /// number of times.
    pub fn initialize(&self) {
        let Some(backend) = &self.backend else {
            return;
        };

        match backend.get(&self.key) {
            Ok(Some(_)) => {}
            Ok(None) => {
                if self.write(&seed_db()) == WriteOutcome::Persisted {
                    info!(key = %self.key, "Local store initialized with seed data");
                }
            }
            Err(err) => error!(key = %self.key, error = %err, "Failed to check local store"),
        }
    }

    pub fn read(&self) -> LocalDb {
        let Some(backend) = &self.backend else {
            return seed_db();
        };

        let raw = match backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return seed_db(),
            Err(err) => {
                error!(key = %self.key, error = %err, "Failed to read local store");
                return seed_db();
            }
        };

        match parse_document(&raw) {
            Ok(db) => db,
            Err(err @ DocumentError::Json(_)) => {
                error!(key = %self.key, error = %err, "Failed to read local store");
                seed_db()
            }
            Err(err) => {
                warn!(
                    key = %self.key,
                    error = %err,
                    "Invalid local store structure, using seed data"
                );
                seed_db()
            }
        }
    }

    pub fn write(&self, db: &LocalDb) -> WriteOutcome {
        let Some(backend) = &self.backend else {
            return WriteOutcome::Skipped;
        };

        let raw = match serde_json::to_string(db) {
            Ok(raw) => raw,
            Err(err) => {
                error!(error = %err, "Failed to serialize local store");
                return WriteOutcome::Dropped;
            }
        };

        match backend.set(&self.key, &raw) {
            Ok(()) => WriteOutcome::Persisted,
            Err(err @ StorageError::QuotaExceeded { .. }) => {
                error!(key = %self.key, error = %err, "Local store quota exceeded, data not saved");
                WriteOutcome::Dropped
            }
            Err(err) => {
                error!(key = %self.key, error = %err, "Failed to write local store");
                WriteOutcome::Dropped
            }
        }
    }

    /// Removes the stored document; later reads return the seed document
    /// until the next write.
    pub fn clear(&self) {
        let Some(backend) = &self.backend else {
            return;
        };

        match backend.remove(&self.key) {
            Ok(()) => info!(key = %self.key, "Local store cleared"),
            Err(err) => error!(key = %self.key, error = %err, "Failed to clear local store"),
        }
    }

    /// Read-modify-write of the whole document. Concurrent callers on the
    /// same store are serialized; the document is only written when `f`
    /// succeeds.
    pub async fn mutate<T, E>(&self, f: impl FnOnce(&mut LocalDb) -> Result<T, E>) -> Result<T, E> {
        let _guard = self.lock.lock().await;
        let mut db = self.read();

        let value = f(&mut db)?;
        let outcome = self.write(&db);
        debug!(?outcome, "Local store mutated");

        Ok(value)
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("key", &self.key)
            .field("available", &self.is_available())
            .finish()
    }
}

fn parse_document(raw: &str) -> Result<LocalDb, DocumentError> {
    let mut document: Value = serde_json::from_str(raw).map_err(DocumentError::Json)?;

    for collection in COLLECTIONS {
        if !document.get(collection).map_or(false, Value::is_array) {
            return Err(DocumentError::MissingCollection(collection));
        }
    }

    Ok(LocalDb {
        programs: parse_rows(&mut document, "programs"),
        program_registrations: parse_rows(&mut document, "program_registrations"),
        enrollments: parse_rows(&mut document, "enrollments"),
    })
}

/// Rows of one collection; malformed rows are dropped one by one.
fn parse_rows<T: DeserializeOwned>(document: &mut Value, collection: &'static str) -> Vec<T> {
    let Some(Value::Array(rows)) = document.get_mut(collection).map(Value::take) else {
        return Vec::new();
    };

    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value(row) {
            Ok(row) => Some(row),
            Err(err) => {
                warn!(collection, index, error = %err, "Skipping malformed local store record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SupervisorProgram;

    fn with_program(mut db: LocalDb, name: &str) -> LocalDb {
        let mut program = SupervisorProgram::draft("supervisor", name, vec![11]);
        program.id = format!("id-{name}");
        db.programs.push(program);
        db
    }

    #[test]
    fn empty_storage_reads_seed() {
        let store = LocalStore::in_memory();
        assert_eq!(store.read(), seed_db());
    }

    #[test]
    fn initialize_is_idempotent() {
        let store = LocalStore::in_memory();
        store.initialize();

        let changed = with_program(store.read(), "kept");
        assert_eq!(store.write(&changed), WriteOutcome::Persisted);

        store.initialize();
        assert_eq!(store.read(), changed);
    }

    #[test]
    fn invalid_structure_reads_seed() {
        let storage = MemoryStorage::new();
        storage
            .set(STORAGE_KEY, r#"{ "programs": [], "enrollments": [] }"#)
            .unwrap();
        let store = LocalStore::new(storage);

        assert_eq!(store.read(), seed_db());
    }

    fn with_malformed_program(db: LocalDb) -> String {
        let mut document = serde_json::to_value(db).unwrap();
        document["programs"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::json!({ "id": "legacy", "programName": "No timestamp" }));
        document.to_string()
    }

    #[test]
    fn malformed_row_keeps_its_neighbours() {
        let storage = MemoryStorage::new();
        let raw = with_malformed_program(with_program(LocalDb::default(), "mine"));
        storage.set(STORAGE_KEY, &raw).unwrap();
        let store = LocalStore::new(storage);

        let ids: Vec<String> = store.read().programs.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["id-mine".to_owned()]);
    }

    #[tokio::test]
    async fn mutation_after_malformed_row_keeps_valid_rows() {
        let storage = MemoryStorage::new();
        let raw = with_malformed_program(with_program(LocalDb::default(), "mine"));
        storage.set(STORAGE_KEY, &raw).unwrap();
        let store = LocalStore::new(storage);

        store
            .mutate(|db| {
                *db = with_program(db.clone(), "added");
                Ok::<_, ()>(())
            })
            .await
            .unwrap();

        let ids: Vec<String> = store.read().programs.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["id-mine".to_owned(), "id-added".to_owned()]);
    }

    #[test]
    fn invalid_json_reads_seed() {
        let storage = MemoryStorage::new();
        storage.set(STORAGE_KEY, "{ not json").unwrap();

        assert_eq!(LocalStore::new(storage).read(), seed_db());
    }

    #[test]
    fn quota_exceeded_drops_write() {
        let store = LocalStore::new(MemoryStorage::with_quota(64));
        let db = with_program(LocalDb::default(), "too-big");

        assert_eq!(store.write(&db), WriteOutcome::Dropped);
        assert_eq!(store.read(), seed_db());
    }

    #[test]
    fn clear_reverts_to_seed() {
        let store = LocalStore::in_memory();
        store.write(&LocalDb::default());
        assert_eq!(store.read(), LocalDb::default());

        store.clear();
        assert_eq!(store.read(), seed_db());
    }

    #[test]
    fn unavailable_store_is_a_no_op() {
        let store = LocalStore::unavailable();
        store.initialize();

        assert_eq!(store.write(&LocalDb::default()), WriteOutcome::Skipped);
        store.clear();
        assert_eq!(store.read(), seed_db());
    }

    #[test]
    fn file_storage_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(FileStorage::new(dir.path()));
        let db = with_program(LocalDb::default(), "on-disk");

        assert_eq!(store.write(&db), WriteOutcome::Persisted);
        assert!(dir.path().join("phillips_db.json").exists());

        let reopened = LocalStore::new(FileStorage::new(dir.path()));
        assert_eq!(reopened.read(), db);

        reopened.clear();
        assert!(!dir.path().join("phillips_db.json").exists());
    }

    #[tokio::test]
    async fn concurrent_mutations_keep_every_write() {
        let store = LocalStore::in_memory();
        store.write(&LocalDb::default());

        let tasks = (0..8).map(|index| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .mutate(|db| {
                        *db = with_program(db.clone(), &index.to_string());
                        Ok::<_, ()>(())
                    })
                    .await
            })
        });

        for task in futures::future::join_all(tasks).await {
            task.unwrap().unwrap();
        }

        assert_eq!(store.read().programs.len(), 8);
    }

    #[tokio::test]
    async fn failed_mutation_is_not_written() {
        let store = LocalStore::in_memory();
        store.write(&LocalDb::default());

        let result = store
            .mutate(|db| {
                db.programs.clear();
                *db = with_program(db.clone(), "discarded");
                Err::<(), _>("rejected")
            })
            .await;

        assert_eq!(result, Err("rejected"));
        assert!(store.read().programs.is_empty());
    }
}

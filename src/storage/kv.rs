//! Key-value snapshot backend.
//!
//! Keeps the snapshot under a primary key and a backup key of any
//! [`BlobStore`]. Older portal builds also left results under
//! `allTestResults`, `testResults` and one `testResult_<n>` key per result;
//! those are read through [`SnapshotBackend::read_legacy`] and removed
//! once the store has persisted what they held.

use super::backend::{BlobStore, LegacyEntry, SnapshotBackend};
use super::model::Database;
use crate::error::{StoreError, StoreResult};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default key holding the primary snapshot.
pub const DEFAULT_STORAGE_KEY: &str = "testPortalDatabase";
/// Default key holding the backup snapshot.
pub const DEFAULT_BACKUP_KEY: &str = "testPortalBackup";

const LEGACY_COLLECTION_KEYS: [&str; 2] = ["allTestResults", "testResults"];
const LEGACY_RECORD_PREFIX: &str = "testResult_";

fn is_legacy_key(key: &str) -> bool {
    LEGACY_COLLECTION_KEYS.contains(&key) || key.starts_with(LEGACY_RECORD_PREFIX)
}

/// Snapshot backend over a key-value blob store.
pub struct KvBackend<S> {
    store: S,
    storage_key: String,
    backup_key: String,
}

impl<S: BlobStore> KvBackend<S> {
    /// Create a backend using the default snapshot keys.
    pub fn new(store: S) -> Self {
        Self::with_keys(store, DEFAULT_STORAGE_KEY, DEFAULT_BACKUP_KEY)
    }

    /// Create a backend using custom snapshot keys.
    pub fn with_keys(store: S, storage_key: impl Into<String>, backup_key: impl Into<String>) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
            backup_key: backup_key.into(),
        }
    }

    /// Borrow the underlying blob store.
    pub fn blobs(&self) -> &S {
        &self.store
    }

    /// Mutably borrow the underlying blob store.
    pub fn blobs_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn read(&self, key: &str) -> StoreResult<Option<Database>> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(Database::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(&mut self, key: &str, db: &Database) -> StoreResult<()> {
        let bytes = serde_json::to_vec(db)?;
        self.store.set(key, &bytes)
    }

    fn legacy_keys(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .store
            .list_keys()?
            .into_iter()
            .filter(|key| is_legacy_key(key))
            .collect())
    }
}

impl<S: BlobStore> SnapshotBackend for KvBackend<S> {
    fn load(&self) -> StoreResult<Option<Database>> {
        self.read(&self.storage_key)
    }

    fn save(&mut self, db: &Database) -> StoreResult<()> {
        let key = self.storage_key.clone();
        self.write(&key, db)
    }

    fn load_backup(&self) -> StoreResult<Option<Database>> {
        self.read(&self.backup_key)
    }

    fn save_backup(&mut self, db: &Database) -> StoreResult<()> {
        let key = self.backup_key.clone();
        self.write(&key, db)
    }

    fn has_backup(&self) -> bool {
        matches!(self.store.get(&self.backup_key), Ok(Some(_)))
    }

    fn read_legacy(&self) -> StoreResult<Vec<LegacyEntry>> {
        let mut entries = Vec::new();

        for key in self.legacy_keys()? {
            if let Some(bytes) = self.store.get(&key)? {
                let value = match serde_json::from_slice::<Value>(&bytes) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!(key = %key, error = %e, "Unreadable legacy entry");
                        None
                    }
                };
                entries.push(LegacyEntry { key, value });
            }
        }

        Ok(entries)
    }

    fn remove_legacy(&mut self, keys: &[String]) -> StoreResult<()> {
        for key in keys.iter().filter(|key| is_legacy_key(key)) {
            self.store.remove(key)?;
            debug!(key = %key, "Removed legacy key");
        }
        Ok(())
    }

    fn purge_legacy(&mut self) -> StoreResult<usize> {
        let keys = self.legacy_keys()?;
        for key in &keys {
            self.store.remove(key)?;
        }
        Ok(keys.len())
    }
}

/// In-memory blob store with an optional byte quota.
#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    entries: HashMap<String, Vec<u8>>,
    quota: Option<usize>,
}

impl MemoryBlobStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes once the total stored bytes
    /// would exceed `limit`.
    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(limit),
        }
    }

    /// Total bytes currently stored.
    pub fn used_bytes(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> StoreResult<()> {
        if let Some(limit) = self.quota {
            let replaced = self.entries.get(key).map_or(0, Vec::len);
            let needed = self.used_bytes() - replaced + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded { needed, limit });
            }
        }

        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn list_keys(&self) -> StoreResult<Vec<String>> {
        let mut keys: Vec<_> = self.entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Blob store keeping one file per key in a directory.
pub struct DirBlobStore {
    dir: PathBuf,
}

const BLOB_EXTENSION: &str = "blob";

impl DirBlobStore {
    /// Open (creating if needed) a blob directory.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            StoreError::StorageUnavailable(format!("{}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    /// Directory holding the blobs.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_file(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }

        Ok(self.dir.join(format!("{}.{}", key, BLOB_EXTENSION)))
    }
}

impl BlobStore for DirBlobStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let file = self.blob_file(key)?;

        if !file.exists() {
            return Ok(None);
        }

        fs::read(&file)
            .map(Some)
            .map_err(|e| StoreError::StorageUnavailable(format!("{}: {}", file.display(), e)))
    }

    fn set(&mut self, key: &str, value: &[u8]) -> StoreResult<()> {
        let file = self.blob_file(key)?;
        fs::write(&file, value)
            .map_err(|e| StoreError::StorageUnavailable(format!("{}: {}", file.display(), e)))
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        let file = self.blob_file(key)?;

        if file.exists() {
            fs::remove_file(&file)?;
        }

        Ok(())
    }

    fn list_keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.dir)
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?
        {
            let path = entry?.path();

            if path.extension().is_some_and(|ext| ext == BLOB_EXTENSION) {
                if let Some(stem) = path.file_stem() {
                    keys.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

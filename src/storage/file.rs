//! JSON file snapshot backend.
//!
//! Stores the whole database as one pretty-printed JSON document, the same
//! `testResults.json` shape static deployments serve. Writes go to a
//! temporary sibling first and are renamed into place, so a snapshot file
//! is never left half-written.

use super::backend::SnapshotBackend;
use super::model::Database;
use crate::error::{StoreError, StoreResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Default snapshot file name.
pub const SNAPSHOT_FILE: &str = "testResults.json";
/// Default backup file name.
pub const BACKUP_FILE: &str = "testResults.backup.json";

/// File-based snapshot storage.
pub struct FileBackend {
    snapshot: PathBuf,
    backup: PathBuf,
}

impl FileBackend {
    /// Create a backend keeping both snapshot files in `dir`.
    pub fn new(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();

        fs::create_dir_all(dir)
            .map_err(|e| StoreError::StorageUnavailable(format!("{}: {}", dir.display(), e)))?;

        Ok(Self {
            snapshot: dir.join(SNAPSHOT_FILE),
            backup: dir.join(BACKUP_FILE),
        })
    }

    /// Path of the primary snapshot.
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot
    }

    /// Path of the backup snapshot.
    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    fn read(path: &Path) -> StoreResult<Option<Database>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read(path)
            .map_err(|e| StoreError::StorageUnavailable(format!("{}: {}", path.display(), e)))?;

        Ok(Some(Database::from_slice(&content)?))
    }

    fn write(path: &Path, db: &Database) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(db)?;
        let staging = path.with_extension("json.tmp");

        fs::write(&staging, content)
            .and_then(|_| fs::rename(&staging, path))
            .map_err(|e| StoreError::StorageUnavailable(format!("{}: {}", path.display(), e)))
    }
}

impl SnapshotBackend for FileBackend {
    fn load(&self) -> StoreResult<Option<Database>> {
        Self::read(&self.snapshot)
    }

    fn save(&mut self, db: &Database) -> StoreResult<()> {
        Self::write(&self.snapshot, db)
    }

    fn load_backup(&self) -> StoreResult<Option<Database>> {
        Self::read(&self.backup)
    }

    fn save_backup(&mut self, db: &Database) -> StoreResult<()> {
        Self::write(&self.backup, db)
    }

    fn has_backup(&self) -> bool {
        self.backup.exists()
    }
}

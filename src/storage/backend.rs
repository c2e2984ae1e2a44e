//! Persistence seams.
//!
//! [`SnapshotBackend`] is what the result store persists through: a primary
//! snapshot slot, a backup slot, and optional legacy-data hooks. The
//! key-value backend sits on top of a [`BlobStore`]; the file backend keeps
//! one JSON document per slot.

use super::model::Database;
use crate::error::StoreResult;
use serde_json::Value;

/// One entry left by an older storage layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyEntry {
    /// Key (or other locator) the entry is stored under.
    pub key: String,
    /// Parsed content, `None` when the stored bytes are not JSON.
    pub value: Option<Value>,
}

/// Whole-snapshot persistence used by the result store.
pub trait SnapshotBackend: Send {
    /// Load the primary snapshot, `None` if nothing has been saved yet.
    fn load(&self) -> StoreResult<Option<Database>>;

    /// Replace the primary snapshot.
    fn save(&mut self, db: &Database) -> StoreResult<()>;

    /// Load the backup snapshot, `None` if no backup exists.
    fn load_backup(&self) -> StoreResult<Option<Database>>;

    /// Replace the backup snapshot.
    fn save_backup(&mut self, db: &Database) -> StoreResult<()>;

    /// Whether a backup snapshot is present.
    fn has_backup(&self) -> bool {
        matches!(self.load_backup(), Ok(Some(_)))
    }

    /// Read data left by older storage layouts without removing it.
    ///
    /// Each value is a single record, an array of records, or an object
    /// carrying a `results` array.
    fn read_legacy(&self) -> StoreResult<Vec<LegacyEntry>> {
        Ok(Vec::new())
    }

    /// Remove the named legacy entries once their data is persisted.
    fn remove_legacy(&mut self, _keys: &[String]) -> StoreResult<()> {
        Ok(())
    }

    /// Remove data left by older storage layouts without reading it.
    /// Returns the number of entries removed.
    fn purge_legacy(&mut self) -> StoreResult<usize> {
        Ok(0)
    }
}

impl<B: SnapshotBackend + ?Sized> SnapshotBackend for Box<B> {
    fn load(&self) -> StoreResult<Option<Database>> {
        (**self).load()
    }

    fn save(&mut self, db: &Database) -> StoreResult<()> {
        (**self).save(db)
    }

    fn load_backup(&self) -> StoreResult<Option<Database>> {
        (**self).load_backup()
    }

    fn save_backup(&mut self, db: &Database) -> StoreResult<()> {
        (**self).save_backup(db)
    }

    fn has_backup(&self) -> bool {
        (**self).has_backup()
    }

    fn read_legacy(&self) -> StoreResult<Vec<LegacyEntry>> {
        (**self).read_legacy()
    }

    fn remove_legacy(&mut self, keys: &[String]) -> StoreResult<()> {
        (**self).remove_legacy(keys)
    }

    fn purge_legacy(&mut self) -> StoreResult<usize> {
        (**self).purge_legacy()
    }
}

/// Opaque key-value blob storage.
pub trait BlobStore: Send {
    /// Fetch a value, `None` if the key is absent.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Store a value under a key, replacing any previous value.
    fn set(&mut self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> StoreResult<()>;

    /// List every stored key.
    fn list_keys(&self) -> StoreResult<Vec<String>>;
}

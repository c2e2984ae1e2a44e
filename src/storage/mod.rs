//! Test result persistence.
//!
//! [`ResultStore`] owns the result collection and its derived statistics
//! and persists whole snapshots through a pluggable [`SnapshotBackend`]:
//! a key-value backend ([`KvBackend`]) over any [`BlobStore`], or a single
//! JSON file ([`FileBackend`]).

mod backend;
mod backup;
mod file;
mod kv;
mod load;
mod model;
mod reconcile;
mod statistics;
mod store;

pub use backend::{BlobStore, LegacyEntry, SnapshotBackend};
pub use backup::{shared, spawn_auto_backup, SharedStore, DEFAULT_BACKUP_INTERVAL};
pub use file::{FileBackend, BACKUP_FILE, SNAPSHOT_FILE};
pub use kv::{DirBlobStore, KvBackend, MemoryBlobStore, DEFAULT_BACKUP_KEY, DEFAULT_STORAGE_KEY};
pub use load::{FileLoadSource, LoadSource};
pub use model::{
    Database, LevelStatistics, Metadata, NewResult, ResultPatch, Statistics, TestResult,
    SCHEMA_VERSION,
};
pub use reconcile::{collect_lenient, merge, parse_incoming};
pub use statistics::recompute;
pub use store::{ImportOutcome, ResultStore, StorageInfo};

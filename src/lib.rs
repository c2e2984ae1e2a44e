//! # Portal Store - Test Result Persistence
//!
//! Portal store keeps the results of a B1/B2/C1 language proficiency test
//! portal in a local snapshot, together with per-level statistics that are
//! always derived from the stored results.
//!
//! ## Features
//!
//! - **Result Store**: Add, update, delete and query results newest-first
//! - **Statistics**: Per-level test count, average score and pass rate
//! - **Reconciliation**: Id-based merge of imported exports
//! - **Backup and Recovery**: Mirrored backup slot plus a periodic backup task
//! - **Export**: Dated JSON and CSV artifacts through pluggable sinks
//! - **Legacy Migration**: One-time fold of older storage layouts
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use portal_store::storage::{KvBackend, MemoryBlobStore, NewResult, ResultStore};
//! use portal_store::types::TestLevel;
//!
//! let mut store = ResultStore::new(KvBackend::new(MemoryBlobStore::new()));
//! store.add_result(NewResult::new(TestLevel::B2, 72.0).with_student("Anna", "anna@example.com"));
//!
//! let stats = store.level_statistics(TestLevel::B2);
//! println!("{} test(s), pass rate {}%", stats.total_tests, stats.pass_rate);
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Levels, grades, result ids and instant parsing
//! - [`storage`] - The result store, its backends and reconciliation
//! - [`output`] - Export artifacts, sinks and terminal formatting
//! - [`config`] - Settings and application paths
//! - [`error`] - Error types
//! - [`cli`] - The `portal-store` command line

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ConfigError, StoreError};
pub use storage::{Database, NewResult, ResultPatch, ResultStore, SnapshotBackend, TestResult};
pub use types::{Grade, GradeInfo, ResultId, TestLevel};

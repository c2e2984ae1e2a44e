//! Initial document fetch.
//!
//! When no local snapshot exists the store asks a [`LoadSource`] for a
//! starting document (a results file shipped with a static deployment).
//! Any failure here falls back to an empty database.

use super::model::Database;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::path::PathBuf;

/// Asynchronous provider of an initial database document.
#[async_trait]
pub trait LoadSource: Send + Sync {
    /// Fetch and parse the document.
    async fn fetch(&self) -> StoreResult<Database>;

    /// Human-readable description used in log lines.
    fn describe(&self) -> String;
}

/// Loads the initial document from a JSON file.
#[derive(Debug, Clone)]
pub struct FileLoadSource {
    path: PathBuf,
}

impl FileLoadSource {
    /// Create a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LoadSource for FileLoadSource {
    async fn fetch(&self) -> StoreResult<Database> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            StoreError::StorageUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        Ok(Database::from_slice(&bytes)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

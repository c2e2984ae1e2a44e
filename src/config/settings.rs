//! Application settings and paths.
//!
//! Manages XDG-compliant paths for configuration and data.

use crate::error::{ConfigError, ConfigResult};
use crate::storage::{DEFAULT_BACKUP_INTERVAL, DEFAULT_BACKUP_KEY, DEFAULT_STORAGE_KEY};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths following XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/portal-store)
    pub config_dir: PathBuf,
    /// Data directory (~/.local/share/portal-store)
    pub data_dir: PathBuf,
}

impl Paths {
    /// Resolve paths using XDG directories, creating them if needed.
    pub fn resolve() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "testportal", "portal-store")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Self::rooted(project.config_dir(), project.data_dir())
    }

    /// Use explicit directories, creating them if needed.
    pub fn rooted(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> ConfigResult<Self> {
        let paths = Self {
            config_dir: config_dir.into(),
            data_dir: data_dir.into(),
        };

        fs::create_dir_all(&paths.config_dir)?;
        fs::create_dir_all(&paths.data_dir)?;

        Ok(paths)
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Directory holding the key-value blobs.
    pub fn kv_dir(&self) -> PathBuf {
        self.data_dir.join("kv")
    }

    /// Directory holding the file-backend snapshots.
    pub fn snapshot_dir(&self) -> PathBuf {
        self.data_dir.join("snapshots")
    }

    /// Default directory for exports.
    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }
}

/// Which snapshot backend to persist through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Key-value blobs, one file per key
    #[default]
    Kv,
    /// A single JSON snapshot file
    File,
}

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Snapshot backend.
    pub backend: BackendKind,
    /// Key holding the primary snapshot (key-value backend).
    pub storage_key: String,
    /// Key holding the backup snapshot (key-value backend).
    pub backup_key: String,
    /// Seconds between automatic backups.
    pub backup_interval_secs: u64,
    /// Initial document loaded when no snapshot exists yet.
    pub data_file: Option<PathBuf>,
    /// Directory exports are written to.
    pub export_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Kv,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            backup_key: DEFAULT_BACKUP_KEY.to_string(),
            backup_interval_secs: DEFAULT_BACKUP_INTERVAL.as_secs(),
            data_file: None,
            export_dir: None,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, falling back to defaults
    /// when no settings file exists.
    pub fn load(paths: &Paths) -> ConfigResult<Self> {
        let file = paths.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Save settings to the default location.
    pub fn save(&self, paths: &Paths) -> ConfigResult<()> {
        self.save_to(&paths.settings_file())
    }

    /// Save settings to a specific file.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Backup interval as a duration (never zero).
    pub fn backup_interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval_secs.max(1))
    }

    /// Export directory, defaulting under the data directory.
    pub fn export_dir(&self, paths: &Paths) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| paths.exports_dir())
    }
}

//! Settings subcommand.
//!
//! Handles `portal-store config`: prints the effective settings, or updates
//! the settings file when any `--set-*` flag is given.

use super::Context;
use crate::config::{AppSettings, BackendKind};
use crate::error::{CliResult, ConfigError};
use crate::output;
use clap::Parser;
use std::path::PathBuf;

/// Show or change persisted settings.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Persist a snapshot backend
    #[arg(long, value_enum)]
    pub set_backend: Option<BackendKind>,

    /// Persist the automatic backup interval in seconds
    #[arg(long, value_name = "SECS")]
    pub set_backup_interval: Option<u64>,

    /// Persist the export directory
    #[arg(long, value_name = "DIR")]
    pub set_export_dir: Option<PathBuf>,

    /// Persist the initial document loaded into an empty store
    #[arg(long, value_name = "FILE")]
    pub set_data_file: Option<PathBuf>,
}

impl ConfigCommand {
    fn has_changes(&self) -> bool {
        self.set_backend.is_some()
            || self.set_backup_interval.is_some()
            || self.set_export_dir.is_some()
            || self.set_data_file.is_some()
    }

    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        if !self.has_changes() {
            let rendered = serde_json::to_string_pretty(&ctx.settings).map_err(ConfigError::from)?;
            println!("{}", rendered);
            return Ok(());
        }

        // Start from what is on disk so global overrides are not persisted.
        let mut settings = match &ctx.config_file {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load(&ctx.paths)?,
        };

        if let Some(backend) = self.set_backend {
            settings.backend = backend;
        }
        if let Some(secs) = self.set_backup_interval {
            settings.backup_interval_secs = secs;
        }
        if let Some(dir) = &self.set_export_dir {
            settings.export_dir = Some(dir.clone());
        }
        if let Some(file) = &self.set_data_file {
            settings.data_file = Some(file.clone());
        }

        let target = match &ctx.config_file {
            Some(path) => {
                settings.save_to(path)?;
                path.clone()
            }
            None => {
                settings.save(&ctx.paths)?;
                ctx.paths.settings_file()
            }
        };

        if !ctx.quiet {
            output::print_success(&format!("Settings saved to {}", target.display()));
        }

        Ok(())
    }
}

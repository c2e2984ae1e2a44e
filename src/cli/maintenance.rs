//! Maintenance subcommands: `recover`, `clear` and `watch`.

use super::{confirm, Context};
use crate::error::CliResult;
use crate::output;
use crate::storage::{shared, spawn_auto_backup};
use clap::Parser;
use tracing::info;

/// Replace the database with the backup snapshot.
#[derive(Parser, Debug)]
pub struct RecoverCommand {}

impl RecoverCommand {
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let mut store = ctx.open_store().await?;

        if store.recover_from_backup() {
            if !ctx.quiet {
                output::print_success(&format!("Recovered {} result(s) from backup", store.len()));
            }
        } else {
            output::print_warning("No usable backup found; nothing changed");
        }

        Ok(())
    }
}

/// Delete every stored result and any legacy entries.
#[derive(Parser, Debug)]
pub struct ClearCommand {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl ClearCommand {
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let mut store = ctx.open_store().await?;

        if !self.yes && !confirm(&format!("Delete all {} result(s)?", store.len()))? {
            if !ctx.quiet {
                output::print_info("Aborted");
            }
            return Ok(());
        }

        if store.clear_all_data() {
            if !ctx.quiet {
                output::print_success("All test data cleared");
            }
        } else {
            output::print_error("Cleared in memory but the empty snapshot could not be saved");
        }

        Ok(())
    }
}

/// Keep the store open and write periodic backups until Ctrl-C.
#[derive(Parser, Debug)]
pub struct WatchCommand {
    /// Seconds between backups (defaults to the configured interval)
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,
}

impl WatchCommand {
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let every = match self.interval {
            Some(secs) => std::time::Duration::from_secs(secs.max(1)),
            None => ctx.settings.backup_interval(),
        };

        let store = shared(ctx.open_store().await?);
        let handle = spawn_auto_backup(store.clone(), every);

        if !ctx.quiet {
            output::print_info(&format!(
                "Backing up every {}s, press Ctrl-C to stop",
                every.as_secs()
            ));
        }

        tokio::signal::ctrl_c().await?;
        handle.abort();

        let mut store = store.lock().await;
        let written = store.backup_snapshot()?;
        info!(written, "Final backup on shutdown");

        Ok(())
    }
}

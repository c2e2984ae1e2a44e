//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `portal-store list` - List and search results
//! - `portal-store stats` - Show per-level statistics
//! - `portal-store delete <id>` - Delete a result
//! - `portal-store export` / `import` - Move snapshots in and out
//! - `portal-store recover` / `clear` / `watch` - Maintenance
//! - `portal-store config` - Show or change settings

mod export;
mod maintenance;
mod results;
mod settings;

pub use export::{ExportCommand, ImportCommand};
pub use maintenance::{ClearCommand, RecoverCommand, WatchCommand};
pub use results::{DeleteCommand, InfoCommand, ListCommand, StatsCommand};
pub use settings::ConfigCommand;

use crate::config::{AppSettings, BackendKind, Paths};
use crate::error::CliResult;
use crate::storage::{
    DirBlobStore, FileBackend, FileLoadSource, KvBackend, LoadSource, ResultStore,
    SnapshotBackend,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Store type the CLI operates on.
pub type CliStore = ResultStore<Box<dyn SnapshotBackend>>;

/// Portal store - test result persistence for the proficiency test portal.
///
/// Records live in a snapshot on local storage; this tool lists, exports,
/// imports and repairs them.
#[derive(Parser, Debug)]
#[command(name = "portal-store")]
#[command(author = "HueCodes <huecodes@proton.me>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Test result storage for the proficiency test portal", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to custom settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long, global = true, value_name = "DIR", env = "PORTAL_STORE_DATA")]
    pub data_dir: Option<PathBuf>,

    /// Override the snapshot backend
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendKind>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List stored results
    #[command(alias = "ls")]
    List(ListCommand),

    /// Show per-level statistics
    Stats(StatsCommand),

    /// Delete a result
    #[command(alias = "rm")]
    Delete(DeleteCommand),

    /// Show storage information
    Info(InfoCommand),

    /// Export results as JSON or CSV
    #[command(alias = "e")]
    Export(ExportCommand),

    /// Import results from a JSON export
    Import(ImportCommand),

    /// Replace the database with the backup snapshot
    Recover(RecoverCommand),

    /// Delete all stored results
    Clear(ClearCommand),

    /// Run the periodic backup until interrupted
    Watch(WatchCommand),

    /// Show or change persisted settings
    Config(ConfigCommand),
}

/// Resolved environment shared by every subcommand.
pub struct Context {
    pub paths: Paths,
    pub settings: AppSettings,
    /// Explicit settings file given with `--config`.
    pub config_file: Option<PathBuf>,
    pub verbose: bool,
    pub quiet: bool,
}

impl Context {
    /// Resolve paths and settings from global flags.
    pub fn from_cli(cli: &Cli) -> CliResult<Self> {
        let mut paths = Paths::resolve()?;
        if let Some(dir) = &cli.data_dir {
            paths = Paths::rooted(paths.config_dir.clone(), dir.clone())?;
        }

        let mut settings = match &cli.config {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load(&paths)?,
        };
        if let Some(backend) = cli.backend {
            settings.backend = backend;
        }

        Ok(Self {
            paths,
            settings,
            config_file: cli.config.clone(),
            verbose: cli.verbose,
            quiet: cli.quiet,
        })
    }

    /// Build the configured snapshot backend.
    pub fn backend(&self) -> CliResult<Box<dyn SnapshotBackend>> {
        let backend: Box<dyn SnapshotBackend> = match self.settings.backend {
            BackendKind::Kv => Box::new(KvBackend::with_keys(
                DirBlobStore::open(self.paths.kv_dir())?,
                self.settings.storage_key.clone(),
                self.settings.backup_key.clone(),
            )),
            BackendKind::File => Box::new(FileBackend::new(self.paths.snapshot_dir())?),
        };
        Ok(backend)
    }

    /// Open the result store over the configured backend.
    pub async fn open_store(&self) -> CliResult<CliStore> {
        let backend = self.backend()?;
        let source = self
            .settings
            .data_file
            .as_ref()
            .map(|path| FileLoadSource::new(path.clone()));

        Ok(ResultStore::open(backend, source.as_ref().map(|s| s as &dyn LoadSource)).await)
    }
}

impl Commands {
    /// Execute the selected subcommand.
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        match self {
            Self::List(cmd) => cmd.execute(ctx).await,
            Self::Stats(cmd) => cmd.execute(ctx).await,
            Self::Delete(cmd) => cmd.execute(ctx).await,
            Self::Info(cmd) => cmd.execute(ctx).await,
            Self::Export(cmd) => cmd.execute(ctx).await,
            Self::Import(cmd) => cmd.execute(ctx).await,
            Self::Recover(cmd) => cmd.execute(ctx).await,
            Self::Clear(cmd) => cmd.execute(ctx).await,
            Self::Watch(cmd) => cmd.execute(ctx).await,
            Self::Config(cmd) => cmd.execute(ctx).await,
        }
    }
}

/// Ask a yes/no question on stdin; anything but `y` declines.
pub(crate) fn confirm(prompt: &str) -> CliResult<bool> {
    println!("{} [y/N] ", prompt);
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

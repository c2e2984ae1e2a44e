//! Export and import subcommands.
//!
//! `export` writes a dated JSON or CSV artifact into the export directory
//! (or stdout); `import` merges a JSON export back in by id.

use super::Context;
use crate::error::CliResult;
use crate::output::{self, DirectorySink, ExportFormat, ExportSink, StdoutSink};
use crate::types::TestLevel;
use clap::Parser;
use std::path::PathBuf;

/// Export results.
#[derive(Parser, Debug)]
pub struct ExportCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
    pub format: ExportFormat,

    /// Limit a CSV export to one level
    #[arg(short, long)]
    pub level: Option<String>,

    /// Output directory (defaults to the configured export directory)
    #[arg(short = 'o', long = "out", value_name = "DIR", conflicts_with = "stdout")]
    pub out_dir: Option<PathBuf>,

    /// Write the artifact to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}

impl ExportCommand {
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let store = ctx.open_store().await?;

        let level = self
            .level
            .as_deref()
            .map(str::parse::<TestLevel>)
            .transpose()?;
        if level.is_some() && self.format == ExportFormat::Json && !ctx.quiet {
            output::print_warning("--level only applies to CSV exports; exporting everything");
        }

        let directory = DirectorySink::new(
            self.out_dir
                .clone()
                .unwrap_or_else(|| ctx.settings.export_dir(&ctx.paths)),
        );
        let sink: &dyn ExportSink = if self.stdout { &StdoutSink } else { &directory };

        let artifact = match self.format {
            ExportFormat::Json => store.export_json(sink).await?,
            ExportFormat::Csv => store.export_csv(level, sink).await?,
        };

        if !self.stdout && !ctx.quiet {
            output::print_success(&format!(
                "Exported {} result(s) to {}",
                store.len(),
                directory.path_for(&artifact.filename).display()
            ));
        }

        Ok(())
    }
}

/// Import results from a JSON export.
#[derive(Parser, Debug)]
pub struct ImportCommand {
    /// JSON file produced by `export` (or a bare array of results)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

impl ImportCommand {
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let bytes = tokio::fs::read(&self.file).await?;
        let mut store = ctx.open_store().await?;

        let outcome = store.import_json(&bytes)?;

        if !ctx.quiet {
            output::print_success(&format!(
                "Imported {} new result(s), {} total",
                outcome.imported, outcome.total
            ));
        }

        Ok(())
    }
}

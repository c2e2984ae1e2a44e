//! Result browsing subcommands: `list`, `stats`, `delete` and `info`.

use super::{confirm, Context};
use crate::error::CliResult;
use crate::output;
use crate::storage::TestResult;
use crate::types::TestLevel;
use clap::Parser;

/// List stored results, newest first.
#[derive(Parser, Debug)]
pub struct ListCommand {
    /// Only show results for this level (B1, B2, C1)
    #[arg(short, long)]
    pub level: Option<String>,

    /// Case-insensitive match on student name, email or level
    #[arg(short, long)]
    pub search: Option<String>,

    /// Earliest timestamp or date to include
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Latest timestamp or date to include
    #[arg(long, requires = "from")]
    pub to: Option<String>,

    /// Maximum number of results to show
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Print the matching records as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let store = ctx.open_store().await?;

        let mut results = match (&self.from, &self.to) {
            (Some(from), Some(to)) => store.results_by_date_range(from, to)?,
            _ => store.all_results(),
        };

        if let Some(level) = &self.level {
            let level: TestLevel = level.parse()?;
            results.retain(|r| r.test_level == level);
        }

        if let Some(query) = &self.search {
            let keep: Vec<_> = store
                .search_results(query)
                .into_iter()
                .map(|r| r.id)
                .collect();
            results.retain(|r| keep.contains(&r.id));
        }

        if let Some(limit) = self.limit {
            results.truncate(limit);
        }

        if self.json {
            let rendered = serde_json::to_string_pretty(&results)
                .map_err(crate::error::StoreError::from)?;
            println!("{}", rendered);
        } else {
            output::print_results(&results)?;
        }

        Ok(())
    }
}

/// Show per-level statistics.
#[derive(Parser, Debug)]
pub struct StatsCommand {
    /// Only show one level
    #[arg(short, long)]
    pub level: Option<String>,
}

impl StatsCommand {
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let store = ctx.open_store().await?;

        match &self.level {
            Some(level) => {
                let level: TestLevel = level.parse()?;
                let stats = store.level_statistics(level);
                println!(
                    "{}: {} test(s), average {}%, pass rate {}%",
                    level, stats.total_tests, stats.average_score, stats.pass_rate
                );
            }
            None => output::print_statistics(store.statistics())?,
        }

        Ok(())
    }
}

/// Delete one result by id or unambiguous id prefix.
#[derive(Parser, Debug)]
pub struct DeleteCommand {
    /// Result id or prefix
    #[arg(value_name = "ID")]
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl DeleteCommand {
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let mut store = ctx.open_store().await?;
        let target: TestResult = store.find_by_prefix(self.id.trim())?.clone();

        if !self.yes && !confirm(&format!("Delete {}?", target.summary()))? {
            if !ctx.quiet {
                output::print_info("Aborted");
            }
            return Ok(());
        }

        if store.delete_result(&target.id).is_some() && !ctx.quiet {
            output::print_success(&format!("Deleted result {}", target.id.short()));
        }

        Ok(())
    }
}

/// Show snapshot size, freshness and backup presence.
#[derive(Parser, Debug)]
pub struct InfoCommand {}

impl InfoCommand {
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let store = ctx.open_store().await?;
        output::print_storage_info(&store.storage_info())?;

        if ctx.verbose {
            let metadata = store.metadata();
            println!("  created: {}", metadata.created.to_rfc3339());
            println!("  schema:  {}", metadata.version);
        }

        Ok(())
    }
}

use anyhow::Result;
use clap::Parser;
use portal_store::cli::{Cli, Context};
use portal_store::output;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let ctx = Context::from_cli(&cli)?;

    if let Err(e) = cli.command.execute(&ctx).await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }

    Ok(())
}

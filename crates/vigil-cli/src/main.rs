//! Vigil CLI - dashboard for watching research sessions.
//!
//! The main entry point for the `vigil` CLI binary.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vigil_cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();
    let config = cli.config();

    // Create runtime and execute
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Start(args) => vigil_cli::commands::start::execute(args, &config).await,
            Commands::Watch(args) => vigil_cli::commands::watch::execute(args, &config).await,
            Commands::History(args) => vigil_cli::commands::history::execute(&args, &config).await,
            Commands::Export(args) => vigil_cli::commands::export::execute(args, &config).await,
        }
    })
}

//! Export command - download a session's CSV export.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use vigil_client::ResearchClient;

use crate::Config;

/// Arguments for the export command.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Session ID to export.
    pub session_id: String,

    /// Output file path (defaults to a timestamped CSV name).
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Execute the export command.
///
/// # Errors
///
/// Returns an error if the API request fails or the file cannot be
/// written.
pub async fn execute(args: ExportArgs, config: &Config) -> Result<()> {
    let client = ResearchClient::new(&config.api_url, config.api_token.clone())
        .context("Failed to create API client")?;

    let bytes = client
        .export_csv(&args.session_id)
        .await
        .context("Failed to download export")?;

    let path = args.output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "research_results_{}.csv",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        ))
    });

    std::fs::write(&path, &bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

//! Start command - launch a research session.

use anyhow::{Context, Result};
use clap::Args;

use vigil_client::ResearchClient;

use crate::{Config, OutputFormat};

/// Arguments for the start command.
#[derive(Debug, Args)]
pub struct StartArgs {
    /// Research topic (e.g. "CDK12 small molecule, preclinical, TNBC").
    pub topic: String,

    /// Immediately watch the new session.
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Poll interval when watching (in seconds).
    #[arg(long, default_value = "3")]
    pub interval: u64,
}

/// Execute the start command.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn execute(args: StartArgs, config: &Config) -> Result<()> {
    let client = ResearchClient::new(&config.api_url, config.api_token.clone())
        .context("Failed to create API client")?;

    let response = client
        .start_research(&args.topic)
        .await
        .context("Failed to start research session")?;

    match config.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&response).context("Failed to serialize response")?
            );
        }
        OutputFormat::Text | OutputFormat::Table => {
            println!("Research session started!");
            println!();
            println!("  Session ID: {}", response.session_id);
            if !response.message.is_empty() {
                println!("  Message:    {}", response.message);
            }
        }
    }

    if args.watch {
        println!();
        let watch_args = super::watch::WatchArgs {
            session_id: response.session_id,
            interval: args.interval,
        };
        super::watch::execute(watch_args, config).await?;
    }

    Ok(())
}

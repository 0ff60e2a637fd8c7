//! Watch command - live view of a running research session.
//!
//! Spawns a polling controller for the session and re-renders the
//! dashboard on every meaningful change. Exits when the session reaches a
//! terminal status, disappears server-side, or the event stream ends.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use owo_colors::OwoColorize;

use vigil_client::{
    PollEvent, PollerConfig, ResearchClient, SessionPoller, SnapshotSource, StopReason,
};

use crate::render;
use crate::Config;

/// Arguments for the watch command.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Session ID to watch.
    pub session_id: String,

    /// Poll interval (in seconds).
    #[arg(long, default_value = "3")]
    pub interval: u64,
}

/// Execute the watch command.
///
/// # Errors
///
/// Returns an error if the client cannot be constructed, the initial
/// fetch fails, or the session disappears server-side.
pub async fn execute(args: WatchArgs, config: &Config) -> Result<()> {
    let client = ResearchClient::new(&config.api_url, config.api_token.clone())
        .context("Failed to create API client")?;

    let poller_config = PollerConfig {
        interval: Duration::from_secs(args.interval),
    };
    let source: Arc<dyn SnapshotSource> = Arc::new(client);
    let mut handle = SessionPoller::spawn(source, args.session_id.clone(), poller_config);

    while let Some(event) = handle.next_event().await {
        match event {
            PollEvent::Loaded(snapshot) => {
                render::render_dashboard(&snapshot, &config.format);
            }
            PollEvent::Updated { snapshot, summary } => {
                println!();
                println!("{} {summary}", "refresh:".dimmed());
                render::render_dashboard(&snapshot, &config.format);
            }
            PollEvent::RefreshFailed { message } => {
                eprintln!("{} {message}", "refresh failed (retrying):".yellow());
            }
            PollEvent::Stopped(StopReason::Terminal(status)) => {
                println!();
                println!("Session finished: {}", render::colorize_status(status));
                return Ok(());
            }
            PollEvent::Stopped(StopReason::SessionDeleted) => {
                anyhow::bail!("Session {} no longer exists on the server", args.session_id);
            }
            PollEvent::Stopped(StopReason::InitialFetchFailed(message)) => {
                anyhow::bail!("Could not load session {}: {message}", args.session_id);
            }
            PollEvent::Stopped(StopReason::Cancelled) => return Ok(()),
        }
    }

    Ok(())
}

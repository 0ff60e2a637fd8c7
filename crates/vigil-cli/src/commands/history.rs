//! History command - list recent research sessions.

use anyhow::{Context, Result};
use clap::Args;

use vigil_client::ResearchClient;

use crate::{Config, OutputFormat};

/// Arguments for the history command.
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Maximum number of sessions to show.
    #[arg(long, default_value = "10")]
    pub limit: usize,
}

/// Execute the history command.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn execute(args: &HistoryArgs, config: &Config) -> Result<()> {
    let client = ResearchClient::new(&config.api_url, config.api_token.clone())
        .context("Failed to create API client")?;

    let mut history = client
        .list_history()
        .await
        .context("Failed to list session history")?;
    history.truncate(args.limit);

    match config.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        OutputFormat::Text => {
            if history.is_empty() {
                println!("No research sessions found");
                return Ok(());
            }

            println!("Recent research sessions:");
            println!();
            for session in &history {
                let status = crate::render::colorize_status(session.status);
                println!(
                    "  {} {} {} ({} entities)",
                    session.session_id, status, session.topic, session.entities_count
                );
            }
        }
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct SessionRow {
                #[tabled(rename = "Session ID")]
                session_id: String,
                #[tabled(rename = "Topic")]
                topic: String,
                #[tabled(rename = "Status")]
                status: String,
                #[tabled(rename = "Entities")]
                entities: u64,
                #[tabled(rename = "Created")]
                created: String,
                #[tabled(rename = "Cost")]
                cost: String,
            }

            let rows: Vec<_> = history
                .iter()
                .map(|s| SessionRow {
                    session_id: s.session_id.clone(),
                    topic: s.topic.clone(),
                    status: s.status.to_string(),
                    entities: s.entities_count,
                    created: s.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    cost: s
                        .total_cost
                        .map_or_else(|| "-".to_string(), |c| format!("${c:.2}")),
                })
                .collect();

            if rows.is_empty() {
                println!("No research sessions found");
            } else {
                println!("{}", Table::new(rows));
            }
        }
    }

    Ok(())
}

//! # vigil-cli
//!
//! Command-line dashboard for the vigil research backend.
//!
//! ## Commands
//!
//! - `vigil start` - Start a research session
//! - `vigil watch` - Watch a session live (poll, diff, render)
//! - `vigil history` - List recent sessions
//! - `vigil export` - Download a session's CSV export
//!
//! ## Configuration
//!
//! The CLI uses environment variables or command-line flags for settings:
//!
//! - `VIGIL_API_URL` - API endpoint (default: `http://localhost:8000`)
//! - `VIGIL_API_TOKEN` - API authentication token

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod commands;
pub mod render;

use clap::{Parser, Subcommand};

/// Vigil CLI - research session dashboard.
#[derive(Debug, Parser)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API server URL.
    #[arg(long, env = "VIGIL_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// API authentication token.
    #[arg(long, env = "VIGIL_API_TOKEN")]
    pub api_token: Option<String>,

    /// Output format.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            api_url: self.api_url.clone(),
            api_token: self.api_token.clone(),
            format: self.format.clone(),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a research session.
    Start(commands::start::StartArgs),
    /// Watch a session live.
    Watch(commands::watch::WatchArgs),
    /// List recent sessions.
    History(commands::history::HistoryArgs),
    /// Download a session's CSV export.
    Export(commands::export::ExportArgs),
}

/// Output format.
#[derive(Debug, Clone, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// Table output.
    Table,
}

/// CLI configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// API server URL.
    pub api_url: String,
    /// API authentication token.
    pub api_token: Option<String>,
    /// Output format.
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_config_from_flags() {
        let cli = Cli::parse_from([
            "vigil",
            "--api-url",
            "https://research.example.com",
            "--api-token",
            "token-abc",
            "--format",
            "json",
            "history",
        ]);

        let config = cli.config();
        assert_eq!(config.api_url, "https://research.example.com");
        assert_eq!(config.api_token.as_deref(), Some("token-abc"));
        assert!(matches!(config.format, OutputFormat::Json));
    }

    #[test]
    fn test_watch_subcommand_parses() {
        let cli = Cli::parse_from(["vigil", "watch", "cdk12-tnbc-1a2b3c4d"]);
        match cli.command {
            Commands::Watch(args) => {
                assert_eq!(args.session_id, "cdk12-tnbc-1a2b3c4d");
            }
            other => panic!("expected watch, got {other:?}"),
        }
    }
}

//! Command-line interface.

use crate::models::Panel;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// A terminal dashboard for a fixed equity watchlist.
///
/// tickerdeck polls a backend for quotes, shows them as cards, and opens a
/// detail view with recent news or an AI analysis for the selected symbol.
#[derive(Parser, Debug, Clone)]
#[command(name = "tickerdeck")]
#[command(version)]
#[command(about = "A terminal stock dashboard with news and AI analysis", long_about = None)]
pub struct Args {
    /// Backend base URL
    #[arg(short = 'u', long, env = "TICKERDECK_URL")]
    pub url: Option<String>,

    /// Refresh period in seconds (overrides the config file)
    #[arg(short = 'd', long, env = "TICKERDECK_DELAY", value_parser = parse_delay)]
    pub delay: Option<f64>,

    /// Number of completed refreshes before exiting
    ///
    /// 0 means infinite
    #[arg(short = 'n', long, default_value = "0")]
    pub iterations: u64,

    /// Batch mode - print the grid after each refresh instead of the TUI
    #[arg(short = 'b', long)]
    pub batch: bool,

    /// Configuration file path
    #[arg(short = 'c', long, env = "TICKERDECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Detail panel shown when a card is opened
    #[arg(short = 'p', long, value_enum)]
    pub panel: Option<PanelArg>,

    /// HTTP timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write log output to this file
    #[arg(long, env = "TICKERDECK_LOG")]
    pub log_file: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PanelArg {
    /// Latest news articles
    News,
    /// AI-generated analysis
    Analysis,
}

impl From<PanelArg> for Panel {
    fn from(arg: PanelArg) -> Self {
        match arg {
            PanelArg::News => Panel::News,
            PanelArg::Analysis => Panel::Analysis,
        }
    }
}

/// Seconds as a finite, non-negative value that fits a `Duration`.
fn parse_delay(value: &str) -> Result<f64, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("`{}` is not a number of seconds", value))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("`{}` is not a valid delay", value))?;
    Ok(secs)
}

impl Args {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Args::parse()
    }
}

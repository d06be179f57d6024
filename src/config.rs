//! Configuration file handling with TOML support.

use crate::models::Panel;
use crate::poller::DEFAULT_REFRESH_INTERVAL;
use anyhow::{Context, Result};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Display settings
    #[serde(default)]
    pub display: DisplayConfig,

    /// Color scheme
    #[serde(default)]
    pub colors: ColorConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Backend base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Refresh interval as a humantime duration ("30s", "1m")
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            refresh_interval: default_refresh_interval(),
            timeout: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}
fn default_refresh_interval() -> String {
    humantime::format_duration(DEFAULT_REFRESH_INTERVAL).to_string()
}
fn default_timeout() -> u64 {
    10
}

impl GeneralConfig {
    /// Parsed refresh interval. Falls back to the default on bad input.
    pub fn refresh_interval(&self) -> Duration {
        match humantime::parse_duration(&self.refresh_interval) {
            Ok(interval) => interval,
            Err(e) => {
                warn!(value = %self.refresh_interval, error = %e, "invalid refresh_interval, using default");
                DEFAULT_REFRESH_INTERVAL
            }
        }
    }
}

/// Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Panel shown when a card is opened
    #[serde(default)]
    pub default_panel: Panel,

    /// Show key hints on cards and in the footer
    #[serde(default = "default_true")]
    pub show_hints: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_panel: Panel::default(),
            show_hints: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Color configuration using hex codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorConfig {
    /// Up cards and modal header
    #[serde(default = "default_up_color")]
    pub up: String,

    /// Down cards and modal header
    #[serde(default = "default_down_color")]
    pub down: String,

    /// Borders
    #[serde(default = "default_border_color")]
    pub border: String,

    /// De-emphasized text
    #[serde(default = "default_muted_color")]
    pub muted: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            up: default_up_color(),
            down: default_down_color(),
            border: default_border_color(),
            muted: default_muted_color(),
        }
    }
}

fn default_up_color() -> String {
    "#10b981".to_string()
}
fn default_down_color() -> String {
    "#ef4444".to_string()
}
fn default_border_color() -> String {
    "#444444".to_string()
}
fn default_muted_color() -> String {
    "#9ca3af".to_string()
}

/// Parse a configured color, falling back to `fallback` (itself a valid hex code).
pub fn parse_color(value: &str, fallback: &str) -> Color {
    Color::from_str(value)
        .or_else(|_| Color::from_str(fallback))
        .unwrap_or(Color::Reset)
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Load configuration from default location or create default.
    pub fn load_or_default() -> Self {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                match Self::load(&path) {
                    Ok(config) => return config,
                    Err(e) => {
                        warn!("Failed to load config: {:#}", e);
                    }
                }
            }
        }
        Config::default()
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tickerdeck").join("config.toml"))
    }
}

/// Generate a sample configuration file content.
pub fn sample_config() -> &'static str {
    r##"# tickerdeck configuration file

[general]
# Backend serving /api/stocks, /api/news/{symbol}, /api/analysis/{symbol}
base_url = "http://127.0.0.1:5000"
# Refresh interval (humantime: "30s", "1m 30s")
refresh_interval = "30s"
# HTTP timeout in seconds
timeout = 10

[display]
# Panel shown when a card is opened: "analysis" or "news"
default_panel = "analysis"
# Show key hints
show_hints = true

[colors]
up = "#10b981"
down = "#ef4444"
border = "#444444"
muted = "#9ca3af"
"##
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.general.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.general.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.display.default_panel, Panel::Analysis);
    }

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(sample_config()).unwrap();
        assert_eq!(config.general.timeout, 10);
        assert_eq!(config.general.refresh_interval(), Duration::from_secs(30));
        assert!(config.display.show_hints);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [general]
            refresh_interval = "1m 30s"

            [display]
            default_panel = "news"
            "#,
        )
        .unwrap();
        assert_eq!(config.general.refresh_interval(), Duration::from_secs(90));
        assert_eq!(config.general.timeout, 10);
        assert_eq!(config.display.default_panel, Panel::News);
        assert_eq!(config.colors.up, "#10b981");
    }

    #[test]
    fn test_invalid_interval_falls_back() {
        let general = GeneralConfig {
            refresh_interval: "soon".to_string(),
            ..GeneralConfig::default()
        };
        assert_eq!(general.refresh_interval(), DEFAULT_REFRESH_INTERVAL);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff0000", "#000000"), Color::Rgb(255, 0, 0));
        assert_eq!(parse_color("not-a-color", "#00ff00"), Color::Rgb(0, 255, 0));
    }

    #[test]
    fn test_load_missing_file_errors() {
        let err = Config::load(Path::new("/nonexistent/tickerdeck.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}

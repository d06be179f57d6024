//! Data models for quotes, news and analysis payloads.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The fixed watchlist, in display order.
pub const WATCHLIST: [&str; 8] = ["MSFT", "GOOG", "AAPL", "CRM", "NVDA", "AMZN", "META", "ORCL"];

/// A point-in-time price snapshot for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Ticker symbol. Not part of the wire body; filled in from the map key.
    #[serde(default, skip_serializing)]
    pub symbol: String,
    /// Current price
    pub price: f64,
    /// Price change from previous close
    #[serde(default)]
    pub change: f64,
    /// Percentage change from previous close
    #[serde(default)]
    pub change_percent: f64,
    /// Direction flag as reported by the backend. Trusted over the sign of `change`.
    #[serde(default = "default_true")]
    pub is_up: bool,
    /// Previous closing price
    #[serde(default)]
    pub previous_close: f64,
}

fn default_true() -> bool {
    true
}

/// Price direction used for arrows and colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn from_flag(is_up: bool) -> Self {
        if is_up { Direction::Up } else { Direction::Down }
    }

    pub fn is_up(self) -> bool {
        self == Direction::Up
    }
}

impl Quote {
    pub fn direction(&self) -> Direction {
        Direction::from_flag(self.is_up)
    }
}

/// Latest quote per symbol. Always replaced as a whole, never patched.
#[derive(Debug, Clone, Default)]
pub struct QuoteStore {
    quotes: HashMap<String, Quote>,
}

impl QuoteStore {
    /// Build a store from a decoded `/api/stocks` body, copying each key into its quote.
    pub fn from_snapshot(snapshot: HashMap<String, Quote>) -> Self {
        let quotes = snapshot
            .into_iter()
            .map(|(symbol, mut quote)| {
                quote.symbol = symbol.clone();
                (symbol, quote)
            })
            .collect();
        Self { quotes }
    }

    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.get(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Quotes for `watchlist` symbols, in watchlist order. Unknown symbols are skipped.
    pub fn in_order<'a>(&'a self, watchlist: &'a [&'a str]) -> impl Iterator<Item = &'a Quote> + 'a {
        watchlist.iter().filter_map(move |symbol| self.quotes.get(*symbol))
    }
}

/// A single news article as served by `/api/news/{symbol}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    /// Raw timestamp, parsed at render time.
    #[serde(default)]
    pub published_at: Option<String>,
}

/// Body of `/api/news/{symbol}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsResponse {
    /// Ignored for rendering; the backend pairs `false` with usable fallback news.
    #[allow(dead_code)]
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub news: Option<Vec<NewsArticle>>,
}

impl NewsResponse {
    pub fn into_articles(self) -> Vec<NewsArticle> {
        self.news.unwrap_or_default()
    }
}

/// Body of `/api/analysis/{symbol}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Which payload the detail modal shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    News,
    #[default]
    Analysis,
}

impl Panel {
    pub fn toggle(self) -> Self {
        match self {
            Panel::News => Panel::Analysis,
            Panel::Analysis => Panel::News,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Panel::News => "News",
            Panel::Analysis => "AI Analysis",
        }
    }
}

impl std::fmt::Display for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Panel::News => write!(f, "news"),
            Panel::Analysis => write!(f, "analysis"),
        }
    }
}

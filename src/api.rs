//! HTTP client for the dashboard backend.

use crate::models::{AnalysisResult, NewsResponse, Quote};
use anyhow::Context;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub type QuoteSnapshot = HashMap<String, Quote>;

/// Transport and decoding failures. Always recovered by the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {0}")]
    Status(StatusCode),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The three backend endpoints the dashboard reads.
pub trait DashboardApi: Send + Sync + 'static {
    /// `GET /api/stocks`
    fn fetch_quotes(&self) -> impl Future<Output = Result<QuoteSnapshot, ApiError>> + Send;

    /// `GET /api/news/{symbol}`
    fn fetch_news(&self, symbol: &str) -> impl Future<Output = Result<NewsResponse, ApiError>> + Send;

    /// `GET /api/analysis/{symbol}`
    fn fetch_analysis(
        &self,
        symbol: &str,
    ) -> impl Future<Output = Result<AnalysisResult, ApiError>> + Send;
}

/// reqwest-backed [`DashboardApi`].
#[derive(Debug, Clone)]
pub struct HttpDashboardApi {
    client: Client,
    base_url: String,
}

impl HttpDashboardApi {
    pub fn new(base_url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn symbol_url(&self, endpoint: &str, symbol: &str) -> String {
        self.url(&format!("/api/{}/{}", endpoint, urlencoding::encode(symbol)))
    }

    async fn get_body(&self, url: &str) -> Result<(StatusCode, String), ApiError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

impl DashboardApi for HttpDashboardApi {
    async fn fetch_quotes(&self) -> Result<QuoteSnapshot, ApiError> {
        let (status, body) = self.get_body(&self.url("/api/stocks")).await?;
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_news(&self, symbol: &str) -> Result<NewsResponse, ApiError> {
        let (status, body) = self.get_body(&self.symbol_url("news", symbol)).await?;
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_analysis(&self, symbol: &str) -> Result<AnalysisResult, ApiError> {
        let (status, body) = self.get_body(&self.symbol_url("analysis", symbol)).await?;
        // Error bodies still carry a usable `error` message.
        match serde_json::from_str(&body) {
            Ok(result) => Ok(result),
            Err(_) if !status.is_success() => Err(ApiError::Status(status)),
            Err(e) => Err(ApiError::Decode(e)),
        }
    }
}

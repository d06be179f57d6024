//! Detail modal controller.
//!
//! Owns the selection and the single outstanding detail request. Every
//! request carries the symbol and id it was issued for; a response is only
//! applied while the modal still shows that exact request.

use crate::api::ApiError;
use crate::format;
use crate::markup::{self, MarkupLine};
use crate::models::{AnalysisResult, Direction, NewsArticle, NewsResponse, Panel, QuoteStore};
use chrono::{Local, TimeZone};
use tracing::{debug, info, warn};

pub const NO_NEWS: &str = "No recent news articles found.";
pub const NO_DESCRIPTION: &str = "No description available.";
pub const CACHED_NOTE: &str = "(cached analysis)";

/// Header snapshot taken from the store when the modal opens.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalHeader {
    pub symbol: String,
    pub price: String,
    pub change: String,
    pub direction: Direction,
}

/// A detail fetch, tagged with what it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub id: u64,
    pub symbol: String,
    pub panel: Panel,
}

/// Decoded response of either detail endpoint.
#[derive(Debug, Clone)]
pub enum DetailPayload {
    News(NewsResponse),
    Analysis(AnalysisResult),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItemView {
    pub title: String,
    pub url: String,
    pub description: String,
    pub meta: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalBody {
    Loading(Panel),
    NoNews,
    News(Vec<NewsItemView>),
    Analysis { lines: Vec<MarkupLine>, cached: bool },
    Error(String),
}

impl ModalBody {
    pub fn loading_text(panel: Panel) -> &'static str {
        match panel {
            Panel::News => "Loading latest news...",
            Panel::Analysis => "Loading AI analysis...",
        }
    }
}

/// State shared by every open phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub header: ModalHeader,
    pub panel: Panel,
    pub body: ModalBody,
    /// Selected article in a news body.
    pub article: usize,
    request_id: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    /// Header shown, body loading.
    Opening(Session),
    Loaded(Session),
    Failed(Session),
}

/// What happened to a resolved request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Loaded,
    Failed,
    /// The selection moved on or the modal closed.
    Discarded,
}

#[derive(Debug, Default)]
pub struct ModalController {
    state: ModalState,
    next_request_id: u64,
}

impl ModalController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            ModalState::Closed => None,
            ModalState::Opening(s) | ModalState::Loaded(s) | ModalState::Failed(s) => Some(s),
        }
    }

    pub fn is_open(&self) -> bool {
        self.session().is_some()
    }

    fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.state {
            ModalState::Closed => None,
            ModalState::Opening(s) | ModalState::Loaded(s) | ModalState::Failed(s) => Some(s),
        }
    }

    /// Move the article selection by `delta`, staying within the list.
    /// Returns false when there is no news list or the selection did not move.
    pub fn select_article(&mut self, delta: isize) -> bool {
        let Some(session) = self.session_mut() else {
            return false;
        };
        let ModalBody::News(items) = &session.body else {
            return false;
        };
        let last = items.len().saturating_sub(1);
        let next = session.article.saturating_add_signed(delta).min(last);
        let moved = next != session.article;
        session.article = next;
        moved
    }

    /// Link of the selected article. `None` outside a news list or when the
    /// article has no url.
    pub fn selected_url(&self) -> Option<&str> {
        let session = self.session()?;
        let ModalBody::News(items) = &session.body else {
            return None;
        };
        let url = items.get(session.article)?.url.as_str();
        (!url.is_empty()).then_some(url)
    }

    /// Currently selected symbol, if any.
    pub fn selection(&self) -> Option<&str> {
        self.session().map(|s| s.header.symbol.as_str())
    }

    /// Select `symbol` and return the request to issue. `None` when the
    /// store has no quote for it.
    pub fn open(&mut self, symbol: &str, store: &QuoteStore, panel: Panel) -> Option<DetailRequest> {
        let quote = store.get(symbol)?;
        let direction = quote.direction();
        let header = ModalHeader {
            symbol: symbol.to_string(),
            price: format!("Price: {}", format::currency(quote.price)),
            change: format!(
                "Change: {} ({})",
                format::signed_currency(quote.change, direction),
                format::signed_percent(quote.change_percent, direction)
            ),
            direction,
        };
        info!(symbol, %panel, "detail opened");
        Some(self.start(header, panel))
    }

    /// Show the other panel for the current selection and refetch.
    pub fn switch_panel(&mut self, panel: Panel) -> Option<DetailRequest> {
        let header = self.session()?.header.clone();
        debug!(symbol = %header.symbol, %panel, "panel switched");
        Some(self.start(header, panel))
    }

    fn start(&mut self, header: ModalHeader, panel: Panel) -> DetailRequest {
        let id = self.next_request_id;
        self.next_request_id += 1;
        let request = DetailRequest {
            id,
            symbol: header.symbol.clone(),
            panel,
        };
        self.state = ModalState::Opening(Session {
            header,
            panel,
            body: ModalBody::Loading(panel),
            article: 0,
            request_id: id,
        });
        request
    }

    /// Apply a response if it still matches the selection and outstanding request.
    pub fn resolve(
        &mut self,
        request: &DetailRequest,
        result: Result<DetailPayload, ApiError>,
    ) -> Resolution {
        let session = match &self.state {
            ModalState::Opening(s) if s.header.symbol == request.symbol && s.request_id == request.id => {
                s.clone()
            }
            _ => {
                debug!(symbol = %request.symbol, id = request.id, "stale detail response discarded");
                return Resolution::Discarded;
            }
        };

        let body = match result {
            Ok(DetailPayload::News(news)) => Ok(render_news(&news.into_articles(), &Local)),
            Ok(DetailPayload::Analysis(analysis)) => render_analysis(analysis),
            Err(e) => {
                warn!(symbol = %request.symbol, panel = %request.panel, error = %e, "detail fetch failed");
                Err(transport_error(request.panel).to_string())
            }
        };

        let (state, resolution) = match body {
            Ok(body) => (ModalState::Loaded(Session { body, ..session }), Resolution::Loaded),
            Err(message) => (
                ModalState::Failed(Session {
                    body: ModalBody::Error(message),
                    ..session
                }),
                Resolution::Failed,
            ),
        };
        self.state = state;
        resolution
    }

    /// Dismiss the modal and drop the selection and any payload.
    pub fn close(&mut self) {
        if let Some(symbol) = self.selection() {
            info!(symbol, "detail closed");
        }
        self.state = ModalState::Closed;
    }
}

fn transport_error(panel: Panel) -> &'static str {
    match panel {
        Panel::News => "Error loading news. Please try again.",
        Panel::Analysis => "Error loading analysis. Please try again.",
    }
}

/// News body: one view per article, or the empty-state marker.
pub fn render_news<Tz>(articles: &[NewsArticle], tz: &Tz) -> ModalBody
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if articles.is_empty() {
        return ModalBody::NoNews;
    }
    let items = articles
        .iter()
        .map(|article| {
            let source = article.source.as_deref().unwrap_or("Unknown source");
            let meta = match article.published_at.as_deref() {
                Some(raw) => format!("{} • {}", source, format::published(raw, tz)),
                None => source.to_string(),
            };
            NewsItemView {
                title: article.title.clone().unwrap_or_else(|| "Untitled".to_string()),
                url: article.url.clone().unwrap_or_default(),
                description: article
                    .description
                    .clone()
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
                meta,
            }
        })
        .collect();
    ModalBody::News(items)
}

/// Analysis body, or the error text to show instead.
pub fn render_analysis(result: AnalysisResult) -> Result<ModalBody, String> {
    match result {
        AnalysisResult {
            success: true,
            analysis: Some(text),
            cached,
            ..
        } => Ok(ModalBody::Analysis {
            lines: markup::render(&text),
            cached,
        }),
        AnalysisResult { error, .. } => Err(format!(
            "Error loading analysis: {}",
            error.as_deref().unwrap_or("Unknown error")
        )),
    }
}

//! Application state and event dispatch.
//!
//! `App` owns both controllers and is the only place state changes. Network
//! calls run on spawned tasks and report back as [`AppEvent`]s, which the main
//! loop feeds to [`App::handle_event`].

use crate::api::{ApiError, DashboardApi, QuoteSnapshot};
use crate::cli::Args;
use crate::config::Config;
use crate::grid::{self, GridView};
use crate::modal::{DetailPayload, DetailRequest, ModalController, Resolution};
use crate::models::{Panel, WATCHLIST};
use crate::poller::{PollingController, RefreshOutcome, RefreshTicket};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Responses coming back from spawned requests.
#[derive(Debug)]
pub enum AppEvent {
    QuotesLoaded {
        ticket: RefreshTicket,
        result: Result<QuoteSnapshot, ApiError>,
    },
    DetailLoaded {
        request: DetailRequest,
        result: Result<DetailPayload, ApiError>,
    },
}

/// Application state.
pub struct App<A: DashboardApi> {
    api: Arc<A>,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
    /// Quote store and refresh cadence
    pub poller: PollingController,
    /// Selection and detail view
    pub modal: ModalController,
    /// Panel used when a card is opened
    pub default_panel: Panel,
    /// Index of the focused card
    pub focused: usize,
    /// Cards per grid row, updated from the terminal width
    pub columns: usize,
    /// Cards the grid area can show, updated from the terminal size
    pub visible_cards: usize,
    /// Modal body scroll offset
    pub scroll: u16,
    /// Completed refreshes, applied or failed
    pub iteration: u64,
    /// Maximum iterations (0 = infinite)
    pub max_iterations: u64,
    /// Is the app running
    pub running: bool,
    /// Batch mode (non-interactive)
    pub batch_mode: bool,
    /// Show key hints
    pub show_hints: bool,
}

impl<A: DashboardApi> App<A> {
    /// Create a new application from CLI args and config.
    pub fn new(args: &Args, config: &Config, api: A) -> Self {
        let period = match args.delay {
            // Enforce minimum refresh interval of 1.0 second
            Some(delay) => Duration::from_secs_f64(delay.max(1.0)),
            None => config.general.refresh_interval().max(Duration::from_secs(1)),
        };
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            api: Arc::new(api),
            events_tx,
            events_rx,
            poller: PollingController::new(period),
            modal: ModalController::new(),
            default_panel: args.panel.map(Into::into).unwrap_or(config.display.default_panel),
            focused: 0,
            columns: 1,
            visible_cards: WATCHLIST.len(),
            scroll: 0,
            iteration: 0,
            max_iterations: args.iterations,
            running: true,
            batch_mode: args.batch,
            show_hints: config.display.show_hints,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.poller.timer().period()
    }

    /// Current grid, rebuilt from the store.
    pub fn grid(&self) -> GridView {
        grid::render_grid(&WATCHLIST, self.poller.store(), self.poller.status())
    }

    /// Timer tick: start a refresh if one is due.
    pub fn tick(&mut self, now: Instant) {
        if let Some(ticket) = self.poller.poll_due(now) {
            self.spawn_refresh(ticket);
        }
    }

    /// Start a refresh outside the timer cadence.
    pub fn force_refresh(&mut self) {
        let ticket = self.poller.begin_refresh();
        self.spawn_refresh(ticket);
    }

    /// Refresh inline and wait for the result. Used by batch mode.
    pub async fn refresh_now(&mut self) -> RefreshOutcome {
        let outcome = self.poller.refresh(self.api.as_ref()).await;
        self.count_refresh(outcome);
        outcome
    }

    fn spawn_refresh(&self, ticket: RefreshTicket) {
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_quotes().await;
            let _ = tx.send(AppEvent::QuotesLoaded { ticket, result });
        });
    }

    fn spawn_detail(&self, request: DetailRequest) {
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = match request.panel {
                Panel::News => api.fetch_news(&request.symbol).await.map(DetailPayload::News),
                Panel::Analysis => api
                    .fetch_analysis(&request.symbol)
                    .await
                    .map(DetailPayload::Analysis),
            };
            let _ = tx.send(AppEvent::DetailLoaded { request, result });
        });
    }

    /// Next queued response without waiting.
    pub fn try_next_event(&mut self) -> Option<AppEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Wait for the next response.
    #[cfg(test)]
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.events_rx.recv().await
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::QuotesLoaded { ticket, result } => {
                let outcome = self.poller.complete_refresh(ticket, result);
                self.count_refresh(outcome);
                self.clamp_focus();
            }
            AppEvent::DetailLoaded { request, result } => {
                if self.modal.resolve(&request, result) != Resolution::Discarded {
                    self.scroll = 0;
                }
            }
        }
    }

    fn count_refresh(&mut self, outcome: RefreshOutcome) {
        if outcome != RefreshOutcome::Stale {
            self.iteration += 1;
        }
    }

    /// Open the detail view for `symbol`.
    pub fn activate(&mut self, symbol: &str) -> Option<DetailRequest> {
        let request = self.modal.open(symbol, self.poller.store(), self.default_panel)?;
        self.scroll = 0;
        self.spawn_detail(request.clone());
        Some(request)
    }

    /// Open the focused card.
    pub fn activate_focused(&mut self) -> Option<DetailRequest> {
        let symbol = self.grid().cards().get(self.focused)?.symbol.clone();
        self.activate(&symbol)
    }

    /// Open the card at `index`, as for a mouse click.
    pub fn activate_index(&mut self, index: usize) -> Option<DetailRequest> {
        self.focused = index;
        self.activate_focused()
    }

    pub fn close_modal(&mut self) {
        self.modal.close();
        self.scroll = 0;
    }

    /// Show `panel` for the open symbol and remember it for later opens.
    pub fn set_panel(&mut self, panel: Panel) -> Option<DetailRequest> {
        if self.modal.session()?.panel == panel {
            return None;
        }
        self.default_panel = panel;
        let request = self.modal.switch_panel(panel)?;
        self.scroll = 0;
        self.spawn_detail(request.clone());
        Some(request)
    }

    pub fn toggle_panel(&mut self) -> Option<DetailRequest> {
        let panel = self.modal.session()?.panel.toggle();
        self.set_panel(panel)
    }

    /// Line up in the modal: previous article in a news list, else scroll.
    pub fn modal_up(&mut self) {
        if self.modal.select_article(-1) {
            self.scroll = 0;
        } else {
            self.scroll_up();
        }
    }

    /// Line down in the modal: next article in a news list, else scroll.
    pub fn modal_down(&mut self) {
        if self.modal.select_article(1) {
            self.scroll = 0;
        } else {
            self.scroll_down();
        }
    }

    /// Open the selected article's link in the system browser.
    pub fn open_article(&self) -> Option<String> {
        let url = self.modal.selected_url()?.to_string();
        match open::that(&url) {
            Ok(()) => info!(%url, "article opened"),
            Err(e) => warn!(%url, error = %e, "failed to open article"),
        }
        Some(url)
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    /// Cards that are both loaded and drawn.
    fn card_count(&self) -> usize {
        self.poller
            .store()
            .in_order(&WATCHLIST)
            .count()
            .min(self.visible_cards)
    }

    /// Record the grid geometry and keep focus on a drawn card.
    pub fn set_grid_capacity(&mut self, columns: usize, visible_cards: usize) {
        self.columns = columns;
        self.visible_cards = visible_cards;
        self.clamp_focus();
    }

    fn clamp_focus(&mut self) {
        self.focused = self.focused.min(self.card_count().saturating_sub(1));
    }

    pub fn focus_left(&mut self) {
        self.focused = self.focused.saturating_sub(1);
    }

    pub fn focus_right(&mut self) {
        if self.focused + 1 < self.card_count() {
            self.focused += 1;
        }
    }

    pub fn focus_up(&mut self) {
        self.focused = self.focused.saturating_sub(self.columns.max(1));
    }

    pub fn focus_down(&mut self) {
        let next = self.focused + self.columns.max(1);
        if next < self.card_count() {
            self.focused = next;
        }
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        debug!("quit requested");
        self.running = false;
    }

    /// Check if max iterations reached.
    pub fn should_quit(&self) -> bool {
        !self.running || (self.max_iterations > 0 && self.iteration >= self.max_iterations)
    }

    /// Time until the next scheduled refresh.
    pub fn next_refresh_in(&self, now: Instant) -> Duration {
        self.poller.timer().remaining(now)
    }
}

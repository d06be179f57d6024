//! Polling controller: owns the quote store and the refresh cadence.

use crate::api::{ApiError, DashboardApi, QuoteSnapshot};
use crate::models::QuoteStore;
use chrono::{DateTime, Local};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Grid-level message shown when quotes cannot be loaded.
pub const LOAD_ERROR: &str = "Error loading stock data. Please try again.";

/// Identifies one issued refresh. Later tickets have higher generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    pub generation: u64,
}

/// Outcome of the latest refresh.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedStatus {
    /// No response has arrived yet.
    #[default]
    Loading,
    Ready,
    Failed(String),
}

/// What [`PollingController::complete_refresh`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    Failed,
    /// A newer refresh was already applied; the response was dropped.
    Stale,
}

/// Fixed-period repeating timer. Deadlines advance by whole periods from the
/// start time, regardless of how the refreshes they trigger turn out.
#[derive(Debug, Clone)]
pub struct RefreshTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl RefreshTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns true once per elapsed period. The first call is always due.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.next_due {
            None => {
                self.next_due = Some(now + self.period);
                true
            }
            Some(next) if now >= next => {
                let mut next = next + self.period;
                // Skip periods missed while the loop was busy.
                while next <= now {
                    next += self.period;
                }
                self.next_due = Some(next);
                true
            }
            Some(_) => false,
        }
    }

    /// Time left until the next tick.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next_due
            .map(|next| next.saturating_duration_since(now))
            .unwrap_or_default()
    }
}

/// Single writer of the [`QuoteStore`].
#[derive(Debug)]
pub struct PollingController {
    store: QuoteStore,
    status: FeedStatus,
    last_updated: Option<DateTime<Local>>,
    timer: RefreshTimer,
    next_generation: u64,
    applied_generation: Option<u64>,
}

impl PollingController {
    pub fn new(period: Duration) -> Self {
        Self {
            store: QuoteStore::default(),
            status: FeedStatus::Loading,
            last_updated: None,
            timer: RefreshTimer::new(period),
            next_generation: 0,
            applied_generation: None,
        }
    }

    pub fn store(&self) -> &QuoteStore {
        &self.store
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    pub fn timer(&self) -> &RefreshTimer {
        &self.timer
    }

    /// Issue a ticket if the timer has fired.
    pub fn poll_due(&mut self, now: Instant) -> Option<RefreshTicket> {
        self.timer.due(now).then(|| self.begin_refresh())
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        let ticket = RefreshTicket {
            generation: self.next_generation,
        };
        self.next_generation += 1;
        debug!(generation = ticket.generation, "refresh issued");
        ticket
    }

    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<QuoteSnapshot, ApiError>,
    ) -> RefreshOutcome {
        if self
            .applied_generation
            .is_some_and(|applied| ticket.generation < applied)
        {
            debug!(generation = ticket.generation, "stale refresh dropped");
            return RefreshOutcome::Stale;
        }

        match result {
            Ok(snapshot) => {
                self.store = QuoteStore::from_snapshot(snapshot);
                self.status = FeedStatus::Ready;
                self.last_updated = Some(Local::now());
                self.applied_generation = Some(ticket.generation);
                info!(
                    generation = ticket.generation,
                    quotes = self.store.len(),
                    "quotes refreshed"
                );
                RefreshOutcome::Applied
            }
            Err(e) => {
                warn!(generation = ticket.generation, error = %e, "quote refresh failed");
                self.status = FeedStatus::Failed(LOAD_ERROR.to_string());
                RefreshOutcome::Failed
            }
        }
    }

    /// One full round trip against `api`.
    pub async fn refresh<A: DashboardApi>(&mut self, api: &A) -> RefreshOutcome {
        let ticket = self.begin_refresh();
        let result = api.fetch_quotes().await;
        self.complete_refresh(ticket, result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{AnalysisResult, NewsResponse, Quote};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) fn quote(price: f64, change: f64, is_up: bool) -> Quote {
        Quote {
            symbol: String::new(),
            price,
            change,
            change_percent: change / (price - change) * 100.0,
            is_up,
            previous_close: price - change,
        }
    }

    pub(crate) fn snapshot(entries: &[(&str, f64)]) -> QuoteSnapshot {
        entries
            .iter()
            .map(|(symbol, price)| (symbol.to_string(), quote(*price, 1.0, true)))
            .collect()
    }

    /// Scripted backend: pops one quotes result per call.
    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub quotes: Mutex<VecDeque<Result<QuoteSnapshot, ()>>>,
        pub calls: AtomicUsize,
    }

    impl DashboardApi for FakeApi {
        async fn fetch_quotes(&self) -> Result<QuoteSnapshot, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.quotes.lock().unwrap().pop_front();
            match next {
                Some(Ok(snapshot)) => Ok(snapshot),
                _ => Err(ApiError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)),
            }
        }

        async fn fetch_news(&self, _symbol: &str) -> Result<NewsResponse, ApiError> {
            Ok(NewsResponse::default())
        }

        async fn fetch_analysis(&self, _symbol: &str) -> Result<AnalysisResult, ApiError> {
            Ok(AnalysisResult::default())
        }
    }

    fn failure() -> Result<QuoteSnapshot, ApiError> {
        Err(ApiError::Status(reqwest::StatusCode::BAD_GATEWAY))
    }

    #[test]
    fn test_timer_first_call_due_then_every_period() {
        let start = Instant::now();
        let mut timer = RefreshTimer::new(Duration::from_secs(30));

        assert!(timer.due(start));
        assert!(!timer.due(start + Duration::from_secs(29)));
        assert!(timer.due(start + Duration::from_secs(30)));
        assert!(!timer.due(start + Duration::from_secs(31)));
        assert!(timer.due(start + Duration::from_secs(60)));
    }

    #[test]
    fn test_timer_skips_missed_periods() {
        let start = Instant::now();
        let mut timer = RefreshTimer::new(Duration::from_secs(30));
        assert!(timer.due(start));
        assert!(timer.due(start + Duration::from_secs(95)));
        assert!(!timer.due(start + Duration::from_secs(110)));
        assert!(timer.due(start + Duration::from_secs(120)));
    }

    #[test]
    fn test_success_replaces_store_wholesale() {
        let mut poller = PollingController::new(DEFAULT_REFRESH_INTERVAL);
        let t1 = poller.begin_refresh();
        poller.complete_refresh(t1, Ok(snapshot(&[("MSFT", 1.0), ("AAPL", 2.0)])));
        let t2 = poller.begin_refresh();
        let outcome = poller.complete_refresh(t2, Ok(snapshot(&[("AAPL", 3.0)])));

        assert_eq!(outcome, RefreshOutcome::Applied);
        assert_eq!(poller.store().len(), 1);
        assert!(poller.store().get("MSFT").is_none());
        assert_eq!(poller.store().get("AAPL").unwrap().price, 3.0);
        assert_eq!(poller.status(), &FeedStatus::Ready);
        assert!(poller.last_updated().is_some());
    }

    #[test]
    fn test_failure_keeps_previous_store() {
        let mut poller = PollingController::new(DEFAULT_REFRESH_INTERVAL);
        let t1 = poller.begin_refresh();
        poller.complete_refresh(t1, Ok(snapshot(&[("MSFT", 1.0)])));
        let updated = poller.last_updated();

        let t2 = poller.begin_refresh();
        let outcome = poller.complete_refresh(t2, failure());

        assert_eq!(outcome, RefreshOutcome::Failed);
        assert_eq!(poller.store().get("MSFT").unwrap().price, 1.0);
        assert_eq!(poller.status(), &FeedStatus::Failed(LOAD_ERROR.to_string()));
        assert_eq!(poller.last_updated(), updated);
    }

    #[test]
    fn test_first_load_failure_sets_error_with_empty_store() {
        let mut poller = PollingController::new(DEFAULT_REFRESH_INTERVAL);
        assert_eq!(poller.status(), &FeedStatus::Loading);
        let t = poller.begin_refresh();
        poller.complete_refresh(t, failure());

        assert!(poller.store().is_empty());
        assert!(matches!(poller.status(), FeedStatus::Failed(_)));
    }

    #[test]
    fn test_older_response_after_newer_is_stale() {
        let mut poller = PollingController::new(DEFAULT_REFRESH_INTERVAL);
        let old = poller.begin_refresh();
        let new = poller.begin_refresh();

        assert_eq!(
            poller.complete_refresh(new, Ok(snapshot(&[("MSFT", 2.0)]))),
            RefreshOutcome::Applied
        );
        assert_eq!(
            poller.complete_refresh(old, Ok(snapshot(&[("MSFT", 1.0)]))),
            RefreshOutcome::Stale
        );
        assert_eq!(poller.store().get("MSFT").unwrap().price, 2.0);
    }

    #[test]
    fn test_overlapping_responses_in_issue_order_both_apply() {
        let mut poller = PollingController::new(DEFAULT_REFRESH_INTERVAL);
        let first = poller.begin_refresh();
        let second = poller.begin_refresh();

        assert_eq!(
            poller.complete_refresh(first, Ok(snapshot(&[("MSFT", 1.0)]))),
            RefreshOutcome::Applied
        );
        assert_eq!(
            poller.complete_refresh(second, Ok(snapshot(&[("MSFT", 2.0)]))),
            RefreshOutcome::Applied
        );
        assert_eq!(poller.store().get("MSFT").unwrap().price, 2.0);
    }

    #[tokio::test]
    async fn test_timer_keeps_firing_through_failures() {
        const FAILURES: usize = 4;
        let api = FakeApi::default();
        let mut poller = PollingController::new(Duration::from_secs(30));
        let start = Instant::now();

        let mut issued = 0;
        for tick in 0..=FAILURES as u32 {
            // Poll a few times within each interval; only one should fire.
            for offset in [0, 1, 15, 29] {
                let now = start + Duration::from_secs(30) * tick + Duration::from_secs(offset);
                if let Some(ticket) = poller.poll_due(now) {
                    issued += 1;
                    let result = api.fetch_quotes().await;
                    assert_eq!(poller.complete_refresh(ticket, result), RefreshOutcome::Failed);
                }
            }
        }

        assert_eq!(issued, FAILURES + 1);
        assert_eq!(api.calls.load(Ordering::SeqCst), FAILURES + 1);
        assert!(poller.store().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_round_trip() {
        let api = FakeApi::default();
        api.quotes
            .lock()
            .unwrap()
            .extend([Ok(snapshot(&[("NVDA", 875.3)])), Err(())]);
        let mut poller = PollingController::new(DEFAULT_REFRESH_INTERVAL);

        assert_eq!(poller.refresh(&api).await, RefreshOutcome::Applied);
        assert_eq!(poller.refresh(&api).await, RefreshOutcome::Failed);
        assert_eq!(poller.store().get("NVDA").unwrap().symbol, "NVDA");
    }
}

//! Card grid: projects the quote store onto the watchlist.

use crate::format;
use crate::models::{Direction, Quote, QuoteStore};
use crate::poller::FeedStatus;

pub const LOADING: &str = "Loading stock data...";

/// Display strings for one card.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub symbol: String,
    pub price: String,
    pub direction: Direction,
    pub arrow: &'static str,
    pub change: String,
    pub percent: String,
    pub previous_close: String,
}

impl Card {
    pub fn from_quote(quote: &Quote) -> Self {
        let direction = quote.direction();
        Self {
            symbol: quote.symbol.clone(),
            price: format::currency(quote.price),
            direction,
            arrow: format::arrow(direction),
            change: format::signed_change(quote.change, direction),
            percent: format::signed_percent(quote.change_percent, direction),
            previous_close: format!("Prev Close: {}", format::currency(quote.previous_close)),
        }
    }

    /// `+2.50 (+0.57%)`
    pub fn change_line(&self) -> String {
        format!("{} ({})", self.change, self.percent)
    }
}

/// What the grid region shows.
#[derive(Debug, Clone, PartialEq)]
pub enum GridView {
    Loading,
    Error(String),
    Cards(Vec<Card>),
}

impl GridView {
    pub fn cards(&self) -> &[Card] {
        match self {
            GridView::Cards(cards) => cards,
            _ => &[],
        }
    }
}

/// Build the grid from scratch. Cards follow `watchlist` order; symbols
/// without a quote get no card. With an empty store the grid shows the
/// loading indicator, or the error message once a refresh has failed.
pub fn render_grid(watchlist: &[&str], store: &QuoteStore, status: &FeedStatus) -> GridView {
    let cards: Vec<Card> = store.in_order(watchlist).map(Card::from_quote).collect();
    if !cards.is_empty() {
        return GridView::Cards(cards);
    }
    match status {
        FeedStatus::Loading => GridView::Loading,
        FeedStatus::Failed(message) => GridView::Error(message.clone()),
        FeedStatus::Ready => GridView::Cards(cards),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WATCHLIST;
    use crate::poller::LOAD_ERROR;
    use crate::poller::tests::quote;
    use std::collections::HashMap;

    fn store(entries: Vec<(&str, Quote)>) -> QuoteStore {
        QuoteStore::from_snapshot(
            entries
                .into_iter()
                .map(|(s, q)| (s.to_string(), q))
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn test_up_card() {
        let store = store(vec![("MSFT", quote(440.5, 2.5, true))]);
        let view = render_grid(&WATCHLIST, &store, &FeedStatus::Ready);
        let card = &view.cards()[0];

        assert_eq!(card.symbol, "MSFT");
        assert_eq!(card.price, "$440.50");
        assert_eq!(card.direction, Direction::Up);
        assert_eq!(card.arrow, "▲");
        assert_eq!(card.change, "+2.50");
        assert!(card.percent.starts_with('+'));
        assert_eq!(card.previous_close, "Prev Close: $438.00");
    }

    #[test]
    fn test_down_card_has_bare_minus() {
        let store = store(vec![("GOOG", quote(205.75, -1.25, false))]);
        let view = render_grid(&WATCHLIST, &store, &FeedStatus::Ready);
        let card = &view.cards()[0];

        assert_eq!(card.direction, Direction::Down);
        assert_eq!(card.arrow, "▼");
        assert_eq!(card.change, "-1.25");
        assert!(card.percent.starts_with('-'));
        assert!(!card.change_line().contains("+-"));
        assert!(!card.change_line().contains("--"));
    }

    #[test]
    fn test_order_follows_watchlist_not_store() {
        let store = store(vec![
            ("ORCL", quote(143.7, 0.7, true)),
            ("AAPL", quote(230.4, 3.4, true)),
            ("MSFT", quote(440.5, 2.5, true)),
            ("TSLA", quote(250.0, 1.0, true)),
        ]);
        let view = render_grid(&WATCHLIST, &store, &FeedStatus::Ready);
        let symbols: Vec<&str> = view.cards().iter().map(|c| c.symbol.as_str()).collect();

        assert_eq!(symbols, vec!["MSFT", "AAPL", "ORCL"]);
    }

    #[test]
    fn test_empty_store_states() {
        let empty = QuoteStore::default();
        assert_eq!(render_grid(&WATCHLIST, &empty, &FeedStatus::Loading), GridView::Loading);
        assert_eq!(
            render_grid(&WATCHLIST, &empty, &FeedStatus::Failed(LOAD_ERROR.to_string())),
            GridView::Error(LOAD_ERROR.to_string())
        );
    }

    #[test]
    fn test_failure_after_success_keeps_cards() {
        let store = store(vec![("NVDA", quote(875.3, -5.7, false))]);
        let view = render_grid(&WATCHLIST, &store, &FeedStatus::Failed(LOAD_ERROR.to_string()));
        assert_eq!(view.cards().len(), 1);
    }
}

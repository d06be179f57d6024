//! Terminal user interface with ratatui.

use crate::api::DashboardApi;
use crate::app::App;
use crate::config::{ColorConfig, parse_color};
use crate::format;
use crate::grid::{Card, GridView, LOADING};
use crate::markup::{BULLET, MarkupLine};
use crate::modal::{CACHED_NOTE, ModalBody, ModalState, NO_NEWS, NewsItemView, Session};
use crate::models::{Direction, Panel};
use crate::poller::FeedStatus;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::time::Instant;

pub const CARD_WIDTH: u16 = 26;
pub const CARD_HEIGHT: u16 = 7;

/// Colors for the UI.
#[derive(Debug, Clone)]
pub struct Theme {
    pub up: Color,
    pub down: Color,
    pub border: Color,
    pub muted: Color,
    pub focus: Color,
    pub header_bg: Color,
}

impl Theme {
    pub fn from_config(colors: &ColorConfig) -> Self {
        let defaults = ColorConfig::default();
        Self {
            up: parse_color(&colors.up, &defaults.up),
            down: parse_color(&colors.down, &defaults.down),
            border: parse_color(&colors.border, &defaults.border),
            muted: parse_color(&colors.muted, &defaults.muted),
            focus: Color::Yellow,
            header_bg: Color::DarkGray,
        }
    }

    fn direction(&self, direction: Direction) -> Color {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&ColorConfig::default())
    }
}

/// Header, grid and footer areas.
pub fn main_layout(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(CARD_HEIGHT),
            Constraint::Length(1), // Footer
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Cards per row for a grid of `width` columns.
pub fn grid_columns(width: u16) -> usize {
    usize::from((width / CARD_WIDTH).max(1))
}

/// Rectangles of the first `count` cards that fit in `area`, row-major.
pub fn card_rects(area: Rect, count: usize) -> Vec<Rect> {
    let columns = grid_columns(area.width);
    (0..count)
        .map_while(|i| {
            let col = (i % columns) as u16;
            let row = (i / columns) as u16;
            let y = area.y.checked_add(row.checked_mul(CARD_HEIGHT)?)?;
            if y >= area.bottom() {
                return None;
            }
            let rect = Rect::new(area.x + col * CARD_WIDTH, y, CARD_WIDTH, CARD_HEIGHT);
            Some(rect.intersection(area))
        })
        .collect()
}

/// Index of the card under `(column, row)`, given the full terminal area.
pub fn card_at(area: Rect, count: usize, column: u16, row: u16) -> Option<usize> {
    let grid_area = main_layout(area)[1];
    card_rects(grid_area, count)
        .iter()
        .position(|rect| rect.contains(Position::new(column, row)))
}

/// The modal's inner panel. Clicks outside it dismiss the modal.
pub fn modal_rect(area: Rect) -> Rect {
    centered_rect(70, 80, area)
}

/// Render the main UI.
pub fn render<A: DashboardApi>(frame: &mut Frame, app: &App<A>, theme: &Theme) {
    let area = frame.area();
    let [header, grid_area, footer] = main_layout(area);

    render_header(frame, app, header, theme);
    render_grid(frame, app, grid_area, theme);
    render_footer(frame, app, footer, theme);

    if let Some(session) = app.modal.session() {
        let pending = matches!(app.modal.state(), ModalState::Opening(_));
        render_modal(frame, session, pending, app.scroll, area, theme);
    }
}

fn render_header<A: DashboardApi>(frame: &mut Frame, app: &App<A>, area: Rect, theme: &Theme) {
    let updated = app
        .poller
        .last_updated()
        .map(|at| format::last_updated(&at))
        .unwrap_or_else(|| "Last updated: never".to_string());
    let next = humantime::format_duration(std::time::Duration::from_secs(
        app.next_refresh_in(Instant::now()).as_secs(),
    ));

    let lines = vec![
        Line::from(vec![
            Span::styled(
                "TICKERDECK ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("- Stock Dashboard"),
        ]),
        Line::from(vec![
            Span::raw(updated),
            Span::styled(format!("  (next refresh in {})", next), Style::default().fg(theme.muted)),
        ]),
    ];

    let header = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(theme.border)),
    );
    frame.render_widget(header, area);
}

fn render_grid<A: DashboardApi>(frame: &mut Frame, app: &App<A>, area: Rect, theme: &Theme) {
    match app.grid() {
        GridView::Loading => render_grid_message(frame, LOADING, theme.muted, area),
        GridView::Error(message) => render_grid_message(frame, &message, theme.down, area),
        GridView::Cards(cards) => {
            let rects = card_rects(area, cards.len());
            for (i, (card, rect)) in cards.iter().zip(rects).enumerate() {
                render_card(frame, card, rect, i == app.focused && !app.modal.is_open(), app.show_hints, theme);
            }
        }
    }
}

fn render_grid_message(frame: &mut Frame, message: &str, color: Color, area: Rect) {
    let widget = Paragraph::new(message)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}

fn render_card(frame: &mut Frame, card: &Card, area: Rect, focused: bool, hints: bool, theme: &Theme) {
    let accent = theme.direction(card.direction);
    let border = if focused {
        Style::default().fg(theme.focus).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(accent)
    };

    let mut lines = vec![
        Line::from(Span::styled(
            card.symbol.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            card.price.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(format!("{} ", card.arrow), Style::default().fg(accent)),
            Span::styled(card.change_line(), Style::default().fg(accent)),
        ]),
        Line::from(Span::styled(card.previous_close.clone(), Style::default().fg(theme.muted))),
    ];
    if hints {
        lines.push(Line::from(Span::styled(
            "Enter for details",
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        )));
    }

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border),
    );
    frame.render_widget(widget, area);
}

fn render_footer<A: DashboardApi>(frame: &mut Frame, app: &App<A>, area: Rect, theme: &Theme) {
    let mut spans = Vec::new();
    if app.show_hints {
        let keys: &[(&str, &str)] = if app.modal.is_open() {
            &[("Esc", ":close "), ("Tab", ":panel "), ("↑↓", ":scroll "), ("Enter", ":open link ")]
        } else {
            &[("q", ":quit "), ("←→↑↓", ":move "), ("Enter", ":open "), ("R", ":refresh ")]
        };
        for (key, action) in keys {
            spans.push(Span::styled(format!(" {}", key), Style::default().fg(Color::Yellow)));
            spans.push(Span::raw(*action));
        }
    }
    spans.push(Span::raw(format!(
        "| {} | Refreshes: {}",
        app.default_panel.title(),
        app.iteration
    )));
    // Cards stay on screen after a failed refresh; the error goes here instead.
    if let (FeedStatus::Failed(message), false) = (app.poller.status(), app.poller.store().is_empty()) {
        spans.push(Span::styled(format!(" | {}", message), Style::default().fg(theme.down)));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.header_bg));
    frame.render_widget(footer, area);
}

fn render_modal(
    frame: &mut Frame,
    session: &Session,
    pending: bool,
    scroll: u16,
    area: Rect,
    theme: &Theme,
) {
    let panel_area = modal_rect(area);
    let accent = theme.direction(session.header.direction);

    frame.render_widget(Clear, panel_area);
    let block = Block::default()
        .title(format!(
            " {}{} ",
            session.header.symbol,
            if pending { " ..." } else { "" }
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent));
    let inner = block.inner(panel_area);
    frame.render_widget(block, panel_area);

    let cached = matches!(session.body, ModalBody::Analysis { cached: true, .. });
    let chunks = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(1), // Tabs
            Constraint::Min(1),    // Body
            Constraint::Length(if cached { 1 } else { 0 }),
        ])
        .split(inner);

    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            session.header.symbol.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(session.header.price.clone()),
        Line::from(session.header.change.clone()),
    ])
    .style(Style::default().fg(Color::White).bg(accent));
    frame.render_widget(header, chunks[0]);

    let tabs: Vec<Span> = [Panel::News, Panel::Analysis]
        .into_iter()
        .map(|panel| {
            let style = if panel == session.panel {
                Style::default().fg(theme.focus).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(theme.muted)
            };
            Span::styled(format!(" {} ", panel.title()), style)
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(tabs)), chunks[1]);

    let body = Paragraph::new(body_lines(&session.body, session.article, theme))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(body, chunks[2]);

    if cached {
        let note = Paragraph::new(CACHED_NOTE)
            .style(Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC));
        frame.render_widget(note, chunks[3]);
    }
}

/// Styled lines for a modal body.
/// Styled lines for a modal body. A news list starts at the selected article.
pub fn body_lines(body: &ModalBody, article: usize, theme: &Theme) -> Vec<Line<'static>> {
    match body {
        ModalBody::Loading(panel) => vec![Line::from(Span::styled(
            ModalBody::loading_text(*panel),
            Style::default().fg(theme.muted),
        ))],
        ModalBody::NoNews => vec![Line::from(Span::styled(NO_NEWS, Style::default().fg(theme.muted)))],
        ModalBody::News(items) => items
            .iter()
            .enumerate()
            .skip(article)
            .flat_map(|(i, item)| news_lines(item, i == article, theme))
            .collect(),
        ModalBody::Analysis { lines, .. } => lines.iter().map(markup_line).collect(),
        ModalBody::Error(message) => vec![Line::from(Span::styled(
            message.clone(),
            Style::default().fg(theme.down),
        ))],
    }
}

fn news_lines(item: &NewsItemView, selected: bool, theme: &Theme) -> Vec<Line<'static>> {
    let marker = if selected { "> " } else { "  " };
    vec![
        Line::from(Span::styled(
            format!("{}{}", marker, item.title),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )),
        Line::from(Span::styled(item.url.clone(), Style::default().fg(theme.muted))),
        Line::from(item.description.clone()),
        Line::from(Span::styled(item.meta.clone(), Style::default().fg(theme.muted))),
        Line::from(""),
    ]
}

fn markup_line(line: &MarkupLine) -> Line<'static> {
    let mut spans = Vec::with_capacity(line.segments.len() + 1);
    if line.bullet {
        spans.push(Span::raw(BULLET));
    }
    for segment in &line.segments {
        let mut style = Style::default();
        if segment.strong {
            style = style.add_modifier(Modifier::BOLD);
        }
        if segment.light {
            style = style.add_modifier(Modifier::ITALIC);
        }
        spans.push(Span::styled(segment.text.clone(), style));
    }
    Line::from(spans)
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(LayoutDirection::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Plain-text grid for batch mode.
pub fn format_batch<A: DashboardApi>(app: &App<A>) -> String {
    let mut out = String::new();
    let updated = app
        .poller
        .last_updated()
        .map(|at| format::last_updated(&at))
        .unwrap_or_else(|| "Last updated: never".to_string());
    out.push_str(&format!("{}\n", updated));

    match app.grid() {
        GridView::Loading => out.push_str(&format!("{}\n", LOADING)),
        GridView::Error(message) => out.push_str(&format!("{}\n", message)),
        GridView::Cards(cards) => {
            out.push_str(&format!(
                "{:<8} {:>12} {:<22} {}\n",
                "SYMBOL", "PRICE", "CHANGE", "PREVIOUS"
            ));
            out.push_str(&format!("{}\n", "-".repeat(64)));
            for card in &cards {
                out.push_str(&format!(
                    "{:<8} {:>12} {} {:<20} {}\n",
                    card.symbol,
                    card.price,
                    card.arrow,
                    card.change_line(),
                    card.previous_close
                ));
            }
            if let FeedStatus::Failed(message) = app.poller.status() {
                out.push_str(&format!("! {}\n", message));
            }
        }
    }
    out
}

/// Render batch mode output (non-interactive).
pub fn render_batch<A: DashboardApi>(app: &App<A>) {
    use chrono::Local;

    println!(
        "\n=== TICKERDECK {} ===",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    print!("{}", format_batch(app));
}

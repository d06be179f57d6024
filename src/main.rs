//! Tickerdeck - A terminal stock dashboard with news and AI analysis.

mod api;
mod app;
mod cli;
mod config;
mod format;
mod grid;
mod markup;
mod modal;
mod models;
mod poller;
mod ui;

use anyhow::{Context, Result};
use api::{DashboardApi, HttpDashboardApi};
use app::App;
use cli::Args;
use config::Config;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use models::{Panel, WATCHLIST};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Position, Rect},
};
use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{Level, info};
use ui::Theme;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse_args();
    init_logging(&args)?;

    // Load configuration
    let config = if let Some(ref path) = args.config {
        match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                eprintln!();
                eprintln!("Sample config:");
                eprintln!("{}", config::sample_config());
                std::process::exit(1);
            }
        }
    } else {
        Config::load_or_default()
    };

    let base_url = args.url.as_deref().unwrap_or(&config.general.base_url);
    let timeout = args.timeout.unwrap_or(config.general.timeout);
    let api = HttpDashboardApi::new(base_url, timeout).context("Failed to build HTTP client")?;
    info!(base_url, timeout, "starting tickerdeck");

    let theme = Theme::from_config(&config.colors);
    let mut app = App::new(&args, &config, api);

    // Run in batch mode or interactive mode
    if app.batch_mode {
        run_batch(&mut app).await
    } else {
        run_interactive(&mut app, &theme).await
    }
}

/// Install the tracing subscriber.
///
/// Batch mode logs to stderr. The TUI owns the terminal, so it only logs when
/// `--log-file` is given.
fn init_logging(args: &Args) -> Result<()> {
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };

    if let Some(ref path) = args.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if args.batch {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

/// Run in batch mode (non-interactive, like top -b).
async fn run_batch<A: DashboardApi>(app: &mut App<A>) -> Result<()> {
    loop {
        app.refresh_now().await;
        ui::render_batch(app);

        if app.should_quit() {
            break;
        }

        tokio::time::sleep(app.refresh_interval()).await;
    }

    Ok(())
}

/// Run in interactive mode with TUI.
async fn run_interactive<A: DashboardApi>(app: &mut App<A>, theme: &Theme) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, app, theme).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Main application loop.
async fn run_app<A: DashboardApi>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<A>,
    theme: &Theme,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);

    loop {
        // Start a refresh if one is due; the first tick always is.
        app.tick(Instant::now());

        // Draw UI
        let area = terminal.draw(|f| ui::render(f, app, theme))?.area;
        let grid_area = ui::main_layout(area)[1];
        app.set_grid_capacity(
            ui::grid_columns(grid_area.width),
            ui::card_rects(grid_area, WATCHLIST.len()).len(),
        );

        // Handle events with timeout
        if crossterm::event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key_event(app, key.code, key.modifiers);
                }
                Event::Mouse(mouse) => handle_mouse_event(app, mouse, area),
                _ => {}
            }
        }

        // Apply responses that arrived meanwhile
        while let Some(event) = app.try_next_event() {
            app.handle_event(event);
        }

        // Check if we should quit
        if app.should_quit() {
            break;
        }

        // Let spawned requests make progress
        tokio::task::yield_now().await;
    }

    Ok(())
}

/// Handle keyboard input.
fn handle_key_event<A: DashboardApi>(app: &mut App<A>, code: KeyCode, modifiers: KeyModifiers) {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    if app.modal.is_open() {
        match code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('x') => app.close_modal(),
            KeyCode::Tab | KeyCode::BackTab => {
                app.toggle_panel();
            }
            KeyCode::Char('n') => {
                app.set_panel(Panel::News);
            }
            KeyCode::Char('a') => {
                app.set_panel(Panel::Analysis);
            }
            KeyCode::Enter | KeyCode::Char('o') => {
                app.open_article();
            }
            KeyCode::Up | KeyCode::Char('k') => app.modal_up(),
            KeyCode::Down | KeyCode::Char('j') => app.modal_down(),
            KeyCode::PageUp => {
                for _ in 0..10 {
                    app.scroll_up();
                }
            }
            KeyCode::PageDown => {
                for _ in 0..10 {
                    app.scroll_down();
                }
            }
            _ => {}
        }
        return;
    }

    match code {
        // Quit
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Navigation
        KeyCode::Left | KeyCode::Char('h') => app.focus_left(),
        KeyCode::Right | KeyCode::Char('l') => app.focus_right(),
        KeyCode::Up | KeyCode::Char('k') => app.focus_up(),
        KeyCode::Down | KeyCode::Char('j') => app.focus_down(),

        // Details
        KeyCode::Enter => {
            app.activate_focused();
        }

        // Refresh
        KeyCode::Char(' ') | KeyCode::Char('R') => app.force_refresh(),

        _ => {}
    }
}

/// Handle mouse clicks: cards open the modal, the backdrop closes it.
fn handle_mouse_event<A: DashboardApi>(app: &mut App<A>, mouse: MouseEvent, area: Rect) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }

    if app.modal.is_open() {
        if !ui::modal_rect(area).contains(Position::new(mouse.column, mouse.row)) {
            app.close_modal();
        }
    } else if let Some(index) = ui::card_at(area, app.grid().cards().len(), mouse.column, mouse.row) {
        app.activate_index(index);
    }
}

//! Terminal front-end (Ratatui + Crossterm)
//! - Talks to SQLite and the upload directory directly
//! - Sets up and restores the terminal

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::{backend::CrosstermBackend, Terminal};
use sqlx::{Pool, Sqlite};
use tracing::{error, info};

use crate::config::Config;

pub mod api;
pub mod input;
pub mod state;
pub mod ui;
pub mod util;

pub async fn run(pool: Pool<Sqlite>, config: &Config) -> Result<()> {
    let mut app = init_app(pool, config).await?;

    install_restore_hook();
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app).await;

    // restore the terminal even when the loop failed
    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!("TUI stopped: {e:#}");
    }
    result
}

/// A panic inside the loop skips the normal restore, so the hook puts the
/// terminal back before the panic message is printed.
fn install_restore_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = crossterm::execute!(std::io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        error!("TUI panicked: {info}");
        previous(info);
    }));
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut state::App,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key).await?;
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.quit {
            info!("Leaving TUI");
            return Ok(());
        }
    }
}

pub async fn init_app(pool: Pool<Sqlite>, config: &Config) -> Result<state::App> {
    let client = api::Client::new(pool, config);
    let settings = client.load_settings().await?;

    let mut app = state::App::new(client, settings);
    app.refresh_settings().await?;
    app.switch_tab(state::Tab::Expenses).await?;
    Ok(app)
}

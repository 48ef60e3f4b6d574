//! TUI main loop.
//!
//! The TUI takes over the terminal by enabling raw mode, entering the
//! alternate screen and hiding the cursor. All of it is reverted on exit,
//! including on panic.
//!
//! Each iteration applies pending reader events, renders, then waits up to
//! one frame for a key press.

use std::io::{self, Stdout};
use std::panic;
use std::time::{Duration, Instant};

use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use thiserror::Error;

use super::app::App;
use super::events::{EventError, EventHandler};
use super::theme::Theme;
use super::ui::render;
use crate::signal::StopToken;

/// Frame budget, roughly 60 FPS.
const FRAME_DURATION: Duration = Duration::from_millis(16);

const POLL_TIMEOUT: Duration = Duration::from_millis(16);

/// Error type for TUI operations.
#[derive(Debug, Error)]
pub enum TuiError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("event error: {0}")]
    Event(#[from] EventError),
}

pub type TuiResult<T> = Result<T, TuiError>;

type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Run the interactive TUI until the user quits.
///
/// A stop request on `shutdown` (e.g. SIGTERM) stops any running session
/// without asking and leaves the loop.
///
/// # Errors
///
/// Returns [`TuiError`] on terminal I/O failure. The terminal is restored
/// in every case.
pub fn run_tui(app: &mut App, shutdown: Option<StopToken>) -> TuiResult<()> {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let result = setup_terminal().and_then(|mut terminal| {
        let looped = event_loop(&mut terminal, app, shutdown.as_ref());
        restore_terminal()?;
        looped
    });

    let _ = panic::take_hook();
    result
}

fn event_loop(
    terminal: &mut Terminal,
    app: &mut App,
    shutdown: Option<&StopToken>,
) -> TuiResult<()> {
    let theme = Theme::auto();
    let events = EventHandler::new();
    let mut last_render = Instant::now();

    loop {
        if shutdown.is_some_and(StopToken::is_stop_requested) {
            log::info!("Shutdown signal received, exiting TUI");
            app.force_exit();
            break;
        }
        if app.should_quit() {
            log::debug!("App requested quit");
            break;
        }

        app.tick();
        terminal.draw(|frame| render(frame, app, &theme))?;

        if let Some(action) = events.poll(POLL_TIMEOUT)? {
            log::trace!("Action: {:?}", action);
            app.handle_action(action);
        }

        let elapsed = last_render.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
        last_render = Instant::now();
    }

    log::info!("TUI exited normally");
    Ok(())
}

fn setup_terminal() -> TuiResult<Terminal> {
    log::debug!("Setting up terminal for TUI");
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    let terminal = ratatui::Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

fn restore_terminal() -> TuiResult<()> {
    terminal::disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)?;
    Ok(())
}

//! Terminal User Interface module using ratatui

mod app;
mod dialogs;
mod events;
mod keys;
mod styles;

pub use app::TuiApp;
use events::EventHandler;

use anyhow::Result;
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::app::ChatApp;

pub type Backend = CrosstermBackend<io::Stdout>;
pub type Frame<'a> = ratatui::Frame<'a>;

const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Initialize the terminal for TUI mode
pub fn init_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
pub fn restore_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Leave raw mode before the default panic output is printed
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        default_hook(info);
    }));
}

/// Main TUI entry point
pub async fn run(chat: ChatApp, export_dir: PathBuf) -> Result<()> {
    let mut event_handler = EventHandler::new(TICK_INTERVAL);
    let mut app = TuiApp::new(chat, export_dir, event_handler.sender());

    let mut terminal = init_terminal()?;
    event_handler.start_input_reader();
    info!("Interactive session started");

    let result = run_app(&mut terminal, &mut app, &mut event_handler).await;

    restore_terminal(&mut terminal)?;
    info!("Interactive session ended");
    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Terminal<Backend>,
    app: &mut TuiApp,
    event_handler: &mut EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        match event_handler.next().await {
            Some(event) => {
                if app.handle_event(event) {
                    break;
                }
            }
            None => break,
        }
    }
    Ok(())
}

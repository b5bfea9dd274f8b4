pub mod app;
pub mod components;
pub mod events;
pub mod markdown;
pub mod theme;

pub use app::App;
pub use events::{Event, EventHandler};
pub use theme::Theme;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::app::AppState;
use crate::error::Result;
use crate::logs;

type Backend = CrosstermBackend<Stdout>;

/// Take over the terminal and run the UI until the user quits
pub async fn run(app_state: Arc<AppState>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    install_panic_hook();

    let result = run_loop(&mut terminal, app_state).await;

    restore_terminal()?;
    terminal.show_cursor()?;
    result
}

async fn run_loop(terminal: &mut Terminal<Backend>, app_state: Arc<AppState>) -> Result<()> {
    let tick_rate = Duration::from_millis(app_state.config().ui.tick_rate_ms);
    let mut events = EventHandler::new(tick_rate);
    let mut app = App::new(app_state, events.sender());

    info!("Terminal UI started");

    while !app.should_quit() {
        terminal.draw(|frame| app.render(frame))?;
        if let Some(event) = events.next().await {
            app.handle_event(event);
        }
    }

    app.shutdown();
    info!("Terminal UI stopped");
    Ok(())
}

fn setup_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

// Leave the alternate screen before the panic message is printed. Panics in
// log subscribers are caught and reported by the broadcaster, and the UI keeps
// running, so the terminal stays as it is for those.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if logs::in_delivery() {
            return;
        }
        let _ = restore_terminal();
        previous(info);
    }));
}

use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;

use super::app::App;

/// How long to wait for input before redrawing.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Take over the terminal, run the menu until the user exits, then hand the
/// terminal back even if the loop failed.
pub fn run_app(app: &mut App) -> Result<()> {
    let mut terminal = ratatui::try_init().context("failed to initialize terminal")?;

    let result = drive(&mut terminal, app);

    terminal
        .show_cursor()
        .context("failed to restore cursor visibility")?;
    ratatui::try_restore().context("failed to restore terminal")?;
    result
}

fn drive(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        if !event::poll(POLL_INTERVAL).context("event polling failed")? {
            continue;
        }
        let Event::Key(key) = event::read().context("failed to read event")? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if is_interrupt(&key) || app.handle_key(key.code)? {
            return Ok(());
        }
    }
}

/// Raw mode swallows SIGINT, so Ctrl-C arrives as a key and quits from any
/// state, including mid-form.
fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

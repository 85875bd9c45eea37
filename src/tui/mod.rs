// Developer console - Terminal User Interface
//
// Keys stand in for the face tracker and the microphone so the whole
// navigator can be driven from a terminal:
// - Terminal initialization and cleanup
// - Event loop (keyboard input, timer ticks, runtime events)
// - Key to gesture mapping

pub mod app;
pub mod input;
pub mod ui;

use crate::input::InputEvent;
use crate::logging::LogBuffer;
use crate::runtime::{AppEvent, Runtime};
use anyhow::{Context, Result};
use app::{ConsoleApp, PromptKind};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// Run the console until the user quits
///
/// Sets up the terminal, runs the event loop, and restores the terminal
/// even when the loop fails.
pub async fn run_console(
    runtime: Runtime,
    mut events_rx: mpsc::Receiver<AppEvent>,
    log_buffer: LogBuffer,
) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = ConsoleApp::new(runtime, log_buffer);
    if let Ok((width, _)) = crossterm::terminal::size() {
        app.runtime.handle(AppEvent::Input(InputEvent::Resize {
            width: console_viewport(width),
        }));
    }
    let result = run_event_loop(&mut terminal, &mut app, &mut events_rx).await;

    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main event loop
///
/// Waits on whichever comes first: a key, a redraw tick, or a runtime event
/// (suggestions, mail results, settle timers) posted by a background task.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut ConsoleApp,
    events_rx: &mut mpsc::Receiver<AppEvent>,
) -> Result<()> {
    let mut tick_interval = tokio::time::interval(Duration::from_millis(200));

    loop {
        terminal
            .draw(|f| ui::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            _ = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    match event::read() {
                        Ok(Event::Key(key_event)) => handle_key_event(app, key_event),
                        Ok(Event::Resize(width, _)) => app.runtime.handle(AppEvent::Input(
                            InputEvent::Resize { width: console_viewport(width) },
                        )),
                        _ => {}
                    }
                }
            } => {}

            _ = tick_interval.tick() => {}

            Some(event) = events_rx.recv() => {
                app.runtime.handle(event);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Terminal columns to the pixel-ish width the grid layout expects
fn console_viewport(columns: u16) -> u16 {
    columns.saturating_mul(8)
}

/// Layered dispatch: prompt, then global keys, then gesture keys
fn handle_key_event(app: &mut ConsoleApp, key_event: KeyEvent) {
    if key_event.kind == KeyEventKind::Release {
        app.handle_key_release(key_event.code);
        return;
    }

    // The prompt captures everything, including repeats while typing
    if app.prompt.is_some() {
        app.prompt_key(key_event.code);
        return;
    }

    if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL)
    {
        app.should_quit = true;
        return;
    }

    if !app.handle_key_press(key_event.code) {
        return;
    }

    match key_event.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char(':') => app.open_prompt(PromptKind::Transcript),
        KeyCode::Char('/') => app.open_prompt(PromptKind::Keys),
        KeyCode::Char('c') => app.open_prompt(PromptKind::Chat),
        KeyCode::Char('x') => app.clear_chat(),
        KeyCode::Char('s') => app.toggle_session(),
        KeyCode::Char(c @ '1'..='3') => {
            app.pick_agent_suggestion(c as usize - '1' as usize);
        }
        code => {
            if let Some(name) = gesture_for_key(code) {
                app.gesture(name);
            }
        }
    }
}

/// Console key bindings for each gesture
fn gesture_for_key(code: KeyCode) -> Option<&'static str> {
    match code {
        KeyCode::Up => Some("Up"),
        KeyCode::Down => Some("Down"),
        KeyCode::Left => Some("Left"),
        KeyCode::Right => Some("Right"),
        KeyCode::Char(' ') | KeyCode::Enter => Some("Select"),
        KeyCode::Char('k') => Some("Open keyboard"),
        KeyCode::Char('[') => Some("Left Wink"),
        KeyCode::Char(']') => Some("Right Wink"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Gesture;

    #[test]
    fn test_every_bound_gesture_parses() {
        for code in [
            KeyCode::Up,
            KeyCode::Down,
            KeyCode::Left,
            KeyCode::Right,
            KeyCode::Enter,
            KeyCode::Char('k'),
            KeyCode::Char('['),
            KeyCode::Char(']'),
        ] {
            let name = gesture_for_key(code).unwrap();
            assert!(Gesture::from_name(name).is_some(), "{} is not a gesture", name);
        }
        // Console-only keys never reach the gesture table
        for c in ['q', ':', '/', 'c', 'x', 's'] {
            assert_eq!(gesture_for_key(KeyCode::Char(c)), None);
        }
    }

    #[test]
    fn test_console_viewport_scales_columns() {
        assert_eq!(console_viewport(80), 640);
        assert_eq!(console_viewport(u16::MAX), u16::MAX);
    }
}

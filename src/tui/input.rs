// Key debounce for the developer console
//
// Every console key stands in for a gesture, and a gesture is one discrete
// event. Holding a key must not machine-gun Select, so each key triggers once
// per press. Terminals that never send Release events get a 150ms debounce
// instead.

use crossterm::event::KeyCode;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Minimum spacing between repeats of a key that was never released
const DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Debug, Default)]
struct KeyState {
    is_pressed: bool,
    last_triggered: Option<Instant>,
}

/// Press/release tracker for state-change keys
#[derive(Debug, Default)]
pub struct InputHandler {
    key_states: HashMap<KeyCode, KeyState>,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the press should trigger an action
    pub fn handle_key_press(&mut self, key: KeyCode) -> bool {
        self.press_at(key, Instant::now())
    }

    fn press_at(&mut self, key: KeyCode, now: Instant) -> bool {
        let state = self.key_states.entry(key).or_default();

        if state.is_pressed {
            // Auto-repeat or a terminal without Release events
            if let Some(last) = state.last_triggered {
                if now.saturating_duration_since(last) >= DEBOUNCE {
                    state.last_triggered = Some(now);
                    return true;
                }
            }
            return false;
        }

        state.is_pressed = true;
        state.last_triggered = Some(now);
        true
    }

    pub fn handle_key_release(&mut self, key: KeyCode) {
        if let Some(state) = self.key_states.get_mut(&key) {
            state.is_pressed = false;
            state.last_triggered = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_key_is_debounced() {
        let mut input = InputHandler::new();
        let start = Instant::now();
        assert!(input.press_at(KeyCode::Char(' '), start));
        assert!(!input.press_at(KeyCode::Char(' '), start + Duration::from_millis(50)));
        assert!(input.press_at(KeyCode::Char(' '), start + Duration::from_millis(200)));
    }

    #[test]
    fn test_release_rearms_key() {
        let mut input = InputHandler::new();
        let start = Instant::now();
        assert!(input.press_at(KeyCode::Up, start));
        input.handle_key_release(KeyCode::Up);
        assert!(input.press_at(KeyCode::Up, start + Duration::from_millis(1)));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut input = InputHandler::new();
        let start = Instant::now();
        assert!(input.press_at(KeyCode::Left, start));
        assert!(input.press_at(KeyCode::Right, start));
    }
}

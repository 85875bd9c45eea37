// Console state
//
// Wraps the runtime with what only the developer console needs: key
// debounce, the one-line prompt used to simulate speech or typing, and the
// log buffer the log panel reads from.

use super::input::InputHandler;
use crate::input::{InputEvent, SessionAction};
use crate::logging::LogBuffer;
use crate::runtime::{AppEvent, Runtime};
use crossterm::event::KeyCode;

/// What a submitted prompt line turns into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Final transcript (simulated speech)
    Transcript,
    /// Text typed on whichever keyboard has focus
    Keys,
    /// Message for the chat assistant
    Chat,
}

impl PromptKind {
    pub fn title(&self) -> &'static str {
        match self {
            PromptKind::Transcript => "Say",
            PromptKind::Keys => "Type",
            PromptKind::Chat => "Ask",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub text: String,
}

pub struct ConsoleApp {
    pub runtime: Runtime,
    pub log_buffer: LogBuffer,
    pub prompt: Option<Prompt>,
    pub last_gesture: Option<String>,
    pub should_quit: bool,
    input: InputHandler,
}

impl ConsoleApp {
    pub fn new(runtime: Runtime, log_buffer: LogBuffer) -> Self {
        Self {
            runtime,
            log_buffer,
            prompt: None,
            last_gesture: None,
            should_quit: false,
            input: InputHandler::new(),
        }
    }

    /// Debounced key press; see [`InputHandler`]
    pub fn handle_key_press(&mut self, key: KeyCode) -> bool {
        self.input.handle_key_press(key)
    }

    pub fn handle_key_release(&mut self, key: KeyCode) {
        self.input.handle_key_release(key);
    }

    /// Simulate a gesture through the same dispatcher frames use
    pub fn gesture(&mut self, name: &str) {
        self.last_gesture = Some(name.to_string());
        self.runtime.handle(AppEvent::Input(InputEvent::Gesture {
            name: name.to_string(),
        }));
    }

    pub fn toggle_session(&mut self) {
        let action = if self.runtime.session().navigator().is_running() {
            SessionAction::Stop
        } else {
            SessionAction::Start
        };
        self.runtime
            .handle(AppEvent::Input(InputEvent::Session { action }));
    }

    /// Pick one of the agent keyboard's quick suggestions
    pub fn pick_agent_suggestion(&mut self, index: usize) {
        self.runtime
            .apply(|session| session.agent_mut().pick_suggestion(index));
    }

    pub fn clear_chat(&mut self) {
        self.runtime.handle(AppEvent::Input(InputEvent::ChatClear));
    }

    pub fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt = Some(Prompt {
            kind,
            text: String::new(),
        });
    }

    /// Line editing while the prompt is open
    pub fn prompt_key(&mut self, key: KeyCode) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Enter => self.submit_prompt(),
            KeyCode::Backspace => {
                prompt.text.pop();
            }
            KeyCode::Char(c) => prompt.text.push(c),
            _ => {}
        }
    }

    fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        if prompt.text.is_empty() {
            return;
        }
        let event = match prompt.kind {
            PromptKind::Transcript => InputEvent::Transcript {
                text: prompt.text,
                is_final: true,
            },
            PromptKind::Keys => InputEvent::Keys { text: prompt.text },
            PromptKind::Chat => InputEvent::Chat { text: prompt.text },
        };
        self.runtime.handle(AppEvent::Input(event));
    }
}

//! Gesture dispatch
//!
//! A [`Session`] owns the classifier and both focus contexts (navigator and
//! agent mode). Frames go through the classifier; simulated gestures from
//! the developer console or a replay skip it and enter at [`Session::dispatch`].
//!
//! Within one tick the mode switches (winks) run first. Everything else keeps
//! the order the classifier reported it in.

use crate::agent::{AgentModeController, AgentSnapshot};
use crate::chat::{ChatPanel, ChatSnapshot};
use crate::effects::Effect;
use crate::gesture::{BlendshapeScore, GestureClassifier, GestureSpec};
use crate::grid::Direction;
use crate::navigator::{Navigator, NavigatorSettings, NavigatorSnapshot};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// Default cooldown for the toggle gestures
pub const DEFAULT_TOGGLE_COOLDOWN: Duration = Duration::from_millis(400);

/// Gestures the dispatcher knows how to route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    Select,
    Move(Direction),
    OpenKeyboard,
    LeftWink,
    RightWink,
}

impl Gesture {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Select" => Some(Self::Select),
            "Open keyboard" => Some(Self::OpenKeyboard),
            "Left Wink" => Some(Self::LeftWink),
            "Right Wink" => Some(Self::RightWink),
            other => Direction::from_name(other).map(Self::Move),
        }
    }

    /// Mode switches jump the queue within a tick
    pub fn is_mode_switch(&self) -> bool {
        matches!(self, Self::LeftWink | Self::RightWink)
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "Select"),
            Self::Move(direction) => write!(f, "{}", direction),
            Self::OpenKeyboard => write!(f, "Open keyboard"),
            Self::LeftWink => write!(f, "Left Wink"),
            Self::RightWink => write!(f, "Right Wink"),
        }
    }
}

/// Minimum spacing between two accepted triggers
#[derive(Debug, Clone)]
pub struct Cooldown {
    window: Duration,
    last_triggered: Option<Instant>,
}

impl Cooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_triggered: None,
        }
    }

    /// Returns true (and arms the cooldown) if enough time has passed
    pub fn try_trigger(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_triggered {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last_triggered = Some(now);
        true
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub navigator: NavigatorSnapshot,
    pub agent: AgentSnapshot,
    pub chat: ChatSnapshot,
}

pub struct Session {
    classifier: GestureClassifier,
    navigator: Navigator,
    agent: AgentModeController,
    chat: ChatPanel,
    keyboard_cooldown: Cooldown,
    agent_cooldown: Cooldown,
}

impl Session {
    pub fn new(
        gestures: Vec<GestureSpec>,
        settings: NavigatorSettings,
        toggle_cooldown: Duration,
    ) -> Self {
        Self {
            classifier: GestureClassifier::new(gestures),
            navigator: Navigator::new(settings),
            agent: AgentModeController::new(),
            chat: ChatPanel::new(),
            keyboard_cooldown: Cooldown::new(toggle_cooldown),
            agent_cooldown: Cooldown::new(toggle_cooldown),
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    pub fn agent(&self) -> &AgentModeController {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut AgentModeController {
        &mut self.agent
    }

    pub fn chat(&self) -> &ChatPanel {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatPanel {
        &mut self.chat
    }

    /// Classify one frame and dispatch whatever fired
    pub fn on_frame(&mut self, scores: &[BlendshapeScore], now: Instant) -> Vec<Effect> {
        let fired = self.classifier.tick(scores);
        if fired.is_empty() {
            return Vec::new();
        }
        self.dispatch(&fired, now)
    }

    /// Apply a batch of gestures fired on the same tick
    pub fn dispatch<S: AsRef<str>>(&mut self, names: &[S], now: Instant) -> Vec<Effect> {
        let mut gestures = Vec::with_capacity(names.len());
        for name in names {
            match Gesture::from_name(name.as_ref()) {
                Some(gesture) => gestures.push(gesture),
                None => tracing::debug!(gesture = name.as_ref(), "No handler for gesture"),
            }
        }
        // Stable: keeps the relative order inside each group
        gestures.sort_by_key(|g| !g.is_mode_switch());

        let mut effects = Vec::new();
        for gesture in gestures {
            tracing::debug!(%gesture, agent = self.agent.is_open(), "Gesture");
            effects.extend(self.apply(gesture, now));
        }
        effects
    }

    fn apply(&mut self, gesture: Gesture, now: Instant) -> Vec<Effect> {
        match gesture {
            Gesture::LeftWink => {
                if !self.agent_cooldown.try_trigger(now) {
                    return Vec::new();
                }
                let effects = self.navigator.disable_transcription();
                self.agent.toggle();
                effects
            }
            Gesture::RightWink => {
                self.agent.close();
                Vec::new()
            }
            _ if self.agent.is_open() => match gesture {
                Gesture::Select => self.agent.select(),
                Gesture::Move(direction) => {
                    self.agent.navigate(direction);
                    Vec::new()
                }
                _ => Vec::new(),
            },
            Gesture::Select => self.navigator.select(),
            Gesture::Move(direction) => {
                self.navigator.navigate(direction);
                Vec::new()
            }
            Gesture::OpenKeyboard => {
                if self.keyboard_cooldown.try_trigger(now) {
                    self.navigator.toggle_keyboard();
                }
                Vec::new()
            }
        }
    }

    /// Free text from the developer console, routed to whichever context
    /// has focus
    pub fn type_text(&mut self, text: &str) -> Vec<Effect> {
        if self.agent.is_open() {
            self.agent.type_text(text)
        } else {
            self.navigator.type_text(text)
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            navigator: self.navigator.snapshot(),
            agent: self.agent.snapshot(),
            chat: self.chat.snapshot(),
        }
    }
}

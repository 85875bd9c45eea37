//! Agent mode
//!
//! A focus context that replaces the navigator while open. It starts on an
//! agent picker; Select opens the highlighted agent (mail composer or
//! search), whose own focus targets then receive the directional gestures.
//!
//! Opening and closing only touches focus. Drafts, results and the activity
//! log live on until the process exits.

pub mod mail;
pub mod mailer;
pub mod search;

pub use mail::{AgentKey, MailSnapshot, MailWizard};
pub use mailer::{DemoMailSender, MailClient, MailError, MailMessage, MailSender};
pub use search::{SearchPanel, SearchSnapshot};

use crate::effects::Effect;
use crate::grid::movement::wrap_index;
use crate::grid::Direction;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Mail,
    Search,
}

impl AgentKind {
    pub const ALL: [AgentKind; 2] = [AgentKind::Mail, AgentKind::Search];

    pub fn label(&self) -> &'static str {
        match self {
            AgentKind::Mail => "AgentMail",
            AgentKind::Search => "Search",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentKind::Mail => {
                "Compose quick emails without leaving the experience."
            }
            AgentKind::Search => "Run lightweight searches and review summarized answers.",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentSnapshot {
    pub open: bool,
    pub selecting: bool,
    pub cursor: usize,
    pub active: AgentKind,
    pub keyboard_suggestions: Vec<&'static str>,
    pub mail: MailSnapshot,
    pub search: SearchSnapshot,
}

pub struct AgentModeController {
    open: bool,
    /// Showing the agent picker rather than an agent
    selecting: bool,
    cursor: usize,
    active: AgentKind,
    mail: MailWizard,
    search: SearchPanel,
}

impl Default for AgentModeController {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentModeController {
    pub fn new() -> Self {
        Self {
            open: false,
            selecting: true,
            cursor: 0,
            active: AgentKind::Mail,
            mail: MailWizard::new(),
            search: SearchPanel::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the picker, or close if already open. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        if self.open {
            self.close();
        } else {
            self.open();
        }
        self.open
    }

    pub fn open(&mut self) {
        tracing::info!("Agent mode opened");
        self.open = true;
        self.selecting = true;
        self.cursor = AgentKind::ALL
            .iter()
            .position(|kind| *kind == self.active)
            .unwrap_or(0);
        self.mail.rewind();
        self.search.unfocus();
    }

    pub fn close(&mut self) {
        if self.open {
            tracing::info!("Agent mode closed");
        }
        self.open = false;
        self.selecting = true;
        self.mail.rewind();
        self.search.unfocus();
    }

    pub fn navigate(&mut self, direction: Direction) {
        if !self.open {
            return;
        }
        if self.selecting {
            self.cursor = wrap_index(self.cursor, direction.step(), AgentKind::ALL.len());
            return;
        }
        match self.active {
            AgentKind::Mail => self.mail.navigate(direction),
            AgentKind::Search => self.search.navigate(direction),
        }
    }

    pub fn select(&mut self) -> Vec<Effect> {
        if !self.open {
            return Vec::new();
        }
        if self.selecting {
            let Some(kind) = AgentKind::ALL.get(self.cursor).copied() else {
                return Vec::new();
            };
            tracing::info!(agent = kind.label(), "Agent selected");
            self.active = kind;
            self.selecting = false;
            match kind {
                AgentKind::Mail => self.mail.rewind(),
                AgentKind::Search => self.search.enter(),
            }
            return Vec::new();
        }
        match self.active {
            AgentKind::Mail => self.mail.select(),
            AgentKind::Search => {
                self.search.select();
                Vec::new()
            }
        }
    }

    /// A key of the agent keyboard
    pub fn press_key(&mut self, key: &AgentKey) -> Vec<Effect> {
        if !self.open || self.selecting {
            return Vec::new();
        }
        match self.active {
            AgentKind::Mail => self.mail.press_key(key),
            AgentKind::Search => {
                self.search.press_key(key);
                Vec::new()
            }
        }
    }

    /// Type free text on the agent keyboard; a newline presses Enter
    pub fn type_text(&mut self, text: &str) -> Vec<Effect> {
        let mut effects = Vec::new();
        for ch in text.chars() {
            let key = match ch {
                ' ' => AgentKey::Space,
                '\n' => AgentKey::Enter,
                '\u{8}' => AgentKey::Backspace,
                c => AgentKey::Char(c),
            };
            effects.extend(self.press_key(&key));
        }
        effects
    }

    /// Quick suggestions shown above the agent keyboard
    pub fn keyboard_suggestions(&self) -> Vec<&'static str> {
        if !self.open || self.selecting {
            return Vec::new();
        }
        match self.active {
            // Mail shows its quick options in the panel instead
            AgentKind::Mail => Vec::new(),
            AgentKind::Search => self.search.keyboard_suggestions(),
        }
    }

    /// Pick the n-th keyboard suggestion
    pub fn pick_suggestion(&mut self, index: usize) -> Vec<Effect> {
        match self.keyboard_suggestions().get(index) {
            Some(text) => self.press_key(&AgentKey::Suggestion(text.to_string())),
            None => Vec::new(),
        }
    }

    pub fn on_mail_result(&mut self, request_id: u64, result: Result<(), MailError>) {
        self.mail.on_send_result(request_id, result);
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            open: self.open,
            selecting: self.selecting,
            cursor: self.cursor,
            active: self.active,
            keyboard_suggestions: self.keyboard_suggestions(),
            mail: self.mail.snapshot(),
            search: self.search.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::mail::MailStep;
    use crate::agent::search::SearchFocus;

    #[test]
    fn test_closed_controller_ignores_input() {
        let mut agent = AgentModeController::new();
        agent.navigate(Direction::Right);
        assert!(agent.select().is_empty());
        assert!(agent.press_key(&AgentKey::Enter).is_empty());
        assert!(!agent.is_open());
    }

    #[test]
    fn test_picker_cycles_and_opens_search() {
        let mut agent = AgentModeController::new();
        assert!(agent.toggle());
        assert!(agent.selecting);

        agent.navigate(Direction::Down);
        agent.navigate(Direction::Down);
        agent.navigate(Direction::Up);
        agent.select();
        assert_eq!(agent.active, AgentKind::Search);
        assert!(!agent.selecting);
        assert_eq!(agent.keyboard_suggestions().len(), 3);

        agent.navigate(Direction::Right);
        assert_eq!(agent.search.focus(), SearchFocus::Run);
    }

    #[test]
    fn test_reopen_starts_on_picker_at_last_agent() {
        let mut agent = AgentModeController::new();
        agent.open();
        agent.navigate(Direction::Right);
        agent.select();
        assert!(!agent.toggle());

        agent.open();
        assert!(agent.selecting);
        agent.select();
        assert_eq!(agent.active, AgentKind::Search);
    }

    #[test]
    fn test_mail_draft_survives_close() {
        let mut agent = AgentModeController::new();
        agent.open();
        agent.select();
        assert_eq!(agent.active, AgentKind::Mail);
        agent.select(); // first recipient
        assert_eq!(agent.snapshot().mail.step, MailStep::Subject);
        agent.navigate(Direction::Down);
        agent.type_text("status");

        agent.close();
        agent.open();
        agent.select();
        assert_eq!(agent.snapshot().mail.step, MailStep::Recipient);
        assert_eq!(agent.snapshot().mail.draft.subject, "status");
    }

    #[test]
    fn test_pick_suggestion_fills_query() {
        let mut agent = AgentModeController::new();
        agent.open();
        agent.navigate(Direction::Left);
        agent.select();
        agent.pick_suggestion(0);
        assert_eq!(agent.snapshot().search.query, "artificial intelligence");
        assert!(agent.pick_suggestion(7).is_empty());
    }
}

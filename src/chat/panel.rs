// Chat panel state
//
// Holds the user and assistant turns shown on screen. One request is in
// flight at a time; sends while waiting and blank sends are ignored. A
// reply always lands as an assistant turn, failures included, so the panel
// never stays stuck loading.

use super::{ChatError, ChatMessage};
use crate::effects::Effect;
use crate::suggest::RequestTracker;
use serde::Serialize;

const EMPTY_REPLY: &str = "Empty response received. Please try again.";

#[derive(Debug, Clone, Serialize)]
pub struct ChatSnapshot {
    pub messages: Vec<ChatMessage>,
    pub loading: bool,
}

#[derive(Debug, Default)]
pub struct ChatPanel {
    messages: Vec<ChatMessage>,
    loading: bool,
    requests: RequestTracker,
}

impl ChatPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, text: &str) -> Vec<Effect> {
        let text = text.trim();
        if text.is_empty() || self.loading {
            tracing::debug!(loading = self.loading, "Chat message ignored");
            return Vec::new();
        }

        self.messages.push(ChatMessage::user(text));
        self.loading = true;
        vec![Effect::Chat {
            request_id: self.requests.issue(),
            messages: self.messages.clone(),
        }]
    }

    pub fn on_reply(&mut self, request_id: u64, result: Result<String, ChatError>) {
        if !self.requests.is_current(request_id) {
            tracing::debug!(request_id, "Dropping stale chat reply");
            return;
        }
        self.loading = false;

        let text = match result {
            Ok(text) => text,
            Err(ChatError::Empty) => EMPTY_REPLY.to_string(),
            Err(e) => {
                tracing::warn!("Chat failed: {}", e);
                format!("Error: {}", e)
            }
        };
        self.messages.push(ChatMessage::assistant(&text));
    }

    /// Forget the conversation; a reply still in flight is dropped
    pub fn clear(&mut self) {
        self.messages.clear();
        self.loading = false;
        self.requests.invalidate();
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            messages: self.messages.clone(),
            loading: self.loading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_id(effects: &[Effect]) -> u64 {
        match effects {
            [Effect::Chat { request_id, .. }] => *request_id,
            other => panic!("expected one chat effect, got {:?}", other),
        }
    }

    #[test]
    fn test_send_carries_history() {
        let mut panel = ChatPanel::new();
        let id = request_id(&panel.send("  hello "));
        panel.on_reply(id, Ok("Hi".into()));

        let effects = panel.send("again");
        match effects.as_slice() {
            [Effect::Chat { messages, .. }] => {
                assert_eq!(
                    messages,
                    &vec![
                        ChatMessage::user("hello"),
                        ChatMessage::assistant("Hi"),
                        ChatMessage::user("again"),
                    ]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(panel.snapshot().loading);
    }

    #[test]
    fn test_blank_or_busy_sends_are_ignored() {
        let mut panel = ChatPanel::new();
        assert!(panel.send("   ").is_empty());
        assert!(!panel.send("first").is_empty());
        assert!(panel.send("second").is_empty());
        assert_eq!(panel.snapshot().messages.len(), 1);
    }

    #[test]
    fn test_failures_become_assistant_turns() {
        let mut panel = ChatPanel::new();
        let id = request_id(&panel.send("a"));
        panel.on_reply(id, Err(ChatError::Empty));
        let id = request_id(&panel.send("b"));
        panel.on_reply(id, Err(ChatError::Network("refused".into())));

        let snapshot = panel.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.messages[1].content, EMPTY_REPLY);
        assert_eq!(snapshot.messages[3].content, "Error: Network error: refused");
    }

    #[test]
    fn test_clear_drops_in_flight_reply() {
        let mut panel = ChatPanel::new();
        let id = request_id(&panel.send("a"));
        panel.clear();
        panel.on_reply(id, Ok("late".into()));
        let snapshot = panel.snapshot();
        assert!(snapshot.messages.is_empty());
        assert!(!snapshot.loading);
    }
}

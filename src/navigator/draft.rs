// Response under construction
//
// Confirmed words plus the fragment currently being typed. The fragment only
// becomes a word when a delimiter is chosen (space, accepting a suggestion,
// enter).

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseDraft {
    confirmed: Vec<String>,
    pending: String,
}

impl ResponseDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirmed(&self) -> &[String] {
        &self.confirmed
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Confirmed words and the pending fragment, space-joined
    pub fn text(&self) -> String {
        let mut parts: Vec<&str> = self.confirmed.iter().map(String::as_str).collect();
        if !self.pending.is_empty() {
            parts.push(&self.pending);
        }
        parts.join(" ")
    }

    pub fn trimmed(&self) -> String {
        self.text().trim().to_string()
    }

    pub fn is_blank(&self) -> bool {
        self.trimmed().is_empty()
    }

    /// Confirmed words only, space-joined
    pub fn confirmed_text(&self) -> String {
        self.confirmed.join(" ")
    }

    /// Append typed characters to the fragment
    pub fn push(&mut self, value: &str) {
        self.pending.push_str(value);
    }

    /// Move a non-blank fragment into the confirmed words. The fragment is
    /// cleared either way. Returns whether a word was added.
    pub fn commit_pending(&mut self) -> bool {
        let word = self.pending.trim().to_string();
        self.pending.clear();
        if word.is_empty() {
            return false;
        }
        self.confirmed.push(word);
        true
    }

    /// Commit the fragment, then append a chosen word
    pub fn accept_word(&mut self, word: &str) {
        self.commit_pending();
        self.confirmed.push(word.to_string());
    }

    /// Replace the fragment with its completion and confirm it
    pub fn complete_fragment(&mut self, word: &str) {
        self.pending.clear();
        self.confirmed.push(word.to_string());
    }

    /// Delete one character; on an empty fragment pull the last word back
    /// into the fragment for editing.
    pub fn backspace(&mut self) {
        if self.pending.pop().is_some() {
            return;
        }
        if let Some(word) = self.confirmed.pop() {
            self.pending = word;
        }
    }

    /// The whole response becomes one sentence
    pub fn replace_with(&mut self, sentence: &str) {
        self.pending.clear();
        self.confirmed = vec![sentence.to_string()];
    }

    pub fn clear(&mut self) {
        self.confirmed.clear();
        self.pending.clear();
    }
}

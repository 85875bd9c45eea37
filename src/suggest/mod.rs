//! Word and sentence suggestions
//!
//! A suggestion round returns a shallow forest of next-word candidates plus a
//! handful of full-sentence completions. Each round replaces the previous one
//! wholesale.
//!
//! # Architecture
//!
//! ```text
//! SuggestionSource trait
//! ├── HttpSuggestionSource (POST {base}/suggest)
//! └── DemoSuggestionSource (canned offline forest)
//! ```
//!
//! Responses are normalized item by item: a malformed node or sentence is
//! dropped without discarding the rest of the payload. Staleness is handled
//! by [`RequestTracker`]; sources never need to cancel anything.

pub mod demo;
pub mod http;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub use demo::DemoSuggestionSource;
pub use http::HttpSuggestionSource;

/// Sentence styles in display order; anything else sorts after these
const PREFERRED_STYLES: [&str; 3] = ["smart", "funny", "casual"];

/// Maximum sentence completions kept per round
pub const MAX_SENTENCES: usize = 3;

/// Default style for sentences that arrive without one
const DEFAULT_STYLE: &str = "smart";

/// "If you pick this word, here is what could come next"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionNode {
    pub word: String,
    pub children: Vec<SuggestionNode>,
}

impl SuggestionNode {
    pub fn leaf(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(word: impl Into<String>, children: Vec<SuggestionNode>) -> Self {
        Self {
            word: word.into(),
            children,
        }
    }
}

/// A full candidate response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentenceSuggestion {
    pub style: String,
    pub text: String,
}

/// Normalized result of one suggestion round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    pub forest: Vec<SuggestionNode>,
    pub sentences: Vec<SentenceSuggestion>,
}

/// Request body for the suggestion endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub question: String,
    pub partial_answer: String,
    pub conversation: String,
    pub suggestions_count: u32,
}

/// Errors from a suggestion source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestError {
    /// Request never produced a response (connect, timeout, client build)
    Network(String),
    /// Endpoint answered with a non-2xx status
    Status { status: u16, message: String },
    /// Body was not JSON
    Decode(String),
}

impl fmt::Display for SuggestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Status { status, message } => {
                write!(f, "Suggestion request failed ({}): {}", status, message)
            }
            Self::Decode(msg) => write!(f, "Invalid suggestion payload: {}", msg),
        }
    }
}

impl std::error::Error for SuggestError {}

/// Anything that can answer a suggestion request
pub trait SuggestionSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    fn fetch(&self, request: SuggestionRequest) -> BoxFuture<'_, Result<Suggestions, SuggestError>>;
}

/// Monotonic request ids: only the latest issued id may be applied
#[derive(Debug, Default, Clone)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new id, superseding every earlier one
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, id: u64) -> bool {
        id == self.latest
    }

    /// Supersede all outstanding requests without issuing a new one
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Normalization
// ─────────────────────────────────────────────────────────────────────────────

/// Normalize a raw `{suggestions, sentences}` payload.
///
/// Nodes need a non-blank string `word`; sentences need a non-blank string
/// `text`. Everything else is dropped per item.
pub fn normalize_response(payload: &Value) -> Suggestions {
    let forest = payload
        .get("suggestions")
        .and_then(Value::as_array)
        .map(|nodes| nodes.iter().filter_map(normalize_node).collect())
        .unwrap_or_default();

    let sentences = payload
        .get("sentences")
        .and_then(Value::as_array)
        .map(|entries| rank_sentences(entries.iter().filter_map(normalize_sentence).collect()))
        .unwrap_or_default();

    Suggestions { forest, sentences }
}

fn normalize_node(node: &Value) -> Option<SuggestionNode> {
    let word = node.get("word")?.as_str()?.trim();
    if word.is_empty() {
        return None;
    }

    let children = node
        .get("next")
        .and_then(Value::as_array)
        .map(|next| next.iter().filter_map(normalize_node).collect())
        .unwrap_or_default();

    Some(SuggestionNode {
        word: word.to_string(),
        children,
    })
}

fn normalize_sentence(entry: &Value) -> Option<SentenceSuggestion> {
    let text = entry.get("text")?.as_str()?.trim();
    if text.is_empty() {
        return None;
    }

    let style = entry
        .get("style")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_STYLE.to_string());

    Some(SentenceSuggestion {
        style,
        text: text.to_string(),
    })
}

fn style_rank(style: &str) -> usize {
    PREFERRED_STYLES
        .iter()
        .position(|preferred| *preferred == style)
        .unwrap_or(PREFERRED_STYLES.len())
}

/// Stable sort by preferred style, then keep the top few
pub fn rank_sentences(mut sentences: Vec<SentenceSuggestion>) -> Vec<SentenceSuggestion> {
    sentences.sort_by_key(|s| style_rank(&s.style));
    sentences.truncate(MAX_SENTENCES);
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_nodes_are_dropped_individually() {
        let payload = json!({
            "suggestions": [
                {"word": "  good ", "next": [{"word": "thanks"}, {"word": "   "}, {"nope": 1}]},
                {"word": ""},
                {"word": 42},
                {"word": "fine"}
            ]
        });

        let normalized = normalize_response(&payload);
        assert_eq!(
            normalized.forest,
            vec![
                SuggestionNode::with_children("good", vec![SuggestionNode::leaf("thanks")]),
                SuggestionNode::leaf("fine"),
            ]
        );
        assert!(normalized.sentences.is_empty());
    }

    #[test]
    fn test_sentences_ranked_by_style_and_truncated() {
        let payload = json!({
            "sentences": [
                {"style": "poetic", "text": "Roses are red."},
                {"style": "Casual", "text": "Doing alright."},
                {"text": "  I am well, thank you.  "},
                {"style": "funny", "text": "Still alive!"},
                {"style": "smart", "text": ""},
                {"style": "smart", "text": "Quite well."}
            ]
        });

        let normalized = normalize_response(&payload);
        let texts: Vec<&str> = normalized.sentences.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["I am well, thank you.", "Quite well.", "Still alive!"]);
        assert_eq!(normalized.sentences[0].style, "smart");
    }

    #[test]
    fn test_unknown_styles_keep_source_order() {
        let sentences = vec![
            SentenceSuggestion {
                style: "zany".into(),
                text: "a".into(),
            },
            SentenceSuggestion {
                style: "dry".into(),
                text: "b".into(),
            },
        ];
        let ranked = rank_sentences(sentences);
        assert_eq!(ranked[0].text, "a");
        assert_eq!(ranked[1].text, "b");
    }

    #[test]
    fn test_non_object_payload_yields_nothing() {
        assert_eq!(normalize_response(&json!("oops")), Suggestions::default());
        assert_eq!(
            normalize_response(&json!({"suggestions": "nope"})),
            Suggestions::default()
        );
    }

    #[test]
    fn test_tracker_only_latest_is_current() {
        let mut tracker = RequestTracker::new();
        let a = tracker.issue();
        let b = tracker.issue();
        assert!(!tracker.is_current(a));
        assert!(tracker.is_current(b));

        tracker.invalidate();
        assert!(!tracker.is_current(b));
    }
}

// Demo mode: canned suggestions so the navigator can be driven offline
//
// Answers look like what the autocomplete service returns for small talk:
// a two-level word forest plus a few styled sentences. A short artificial
// latency keeps the loading placeholder visible.
//
// Run with: VOICELINK_DEMO=1 cargo run --release

use super::{SentenceSuggestion, SuggestError, SuggestionNode, SuggestionRequest, SuggestionSource, Suggestions};
use futures::future::BoxFuture;
use std::time::Duration;

/// Simulated round-trip latency
const DEMO_LATENCY: Duration = Duration::from_millis(300);

/// Offline suggestion source with a fixed vocabulary
#[derive(Debug)]
pub struct DemoSuggestionSource {
    latency: Option<Duration>,
}

impl DemoSuggestionSource {
    pub fn new() -> Self {
        Self {
            latency: Some(DEMO_LATENCY),
        }
    }

    /// No artificial delay
    #[cfg(test)]
    pub fn instant() -> Self {
        Self { latency: None }
    }
}

impl SuggestionSource for DemoSuggestionSource {
    fn name(&self) -> &'static str {
        "demo"
    }

    fn fetch(&self, request: SuggestionRequest) -> BoxFuture<'_, Result<Suggestions, SuggestError>> {
        Box::pin(async move {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            Ok(canned_suggestions(&request))
        })
    }
}

fn node(word: &str, next: &[&str]) -> SuggestionNode {
    SuggestionNode::with_children(word, next.iter().map(|w| SuggestionNode::leaf(*w)).collect())
}

fn sentence(style: &str, text: &str) -> SentenceSuggestion {
    SentenceSuggestion {
        style: style.to_string(),
        text: text.to_string(),
    }
}

/// Pick a canned round based on the question and how far the answer got
fn canned_suggestions(request: &SuggestionRequest) -> Suggestions {
    let question = request.question.to_lowercase();
    let limit = request.suggestions_count.max(1) as usize;

    let (mut forest, sentences) = if question.contains("how are") || question.contains("feeling") {
        (
            vec![
                node("good", &["thanks", "today"]),
                node("tired", &["but", "today"]),
                node("great", &["thanks"]),
                node("okay", &["I", "guess"]),
            ],
            vec![
                sentence("smart", "I'm doing well, thank you for asking."),
                sentence("funny", "Still running on coffee, but happy."),
                sentence("casual", "Pretty good, you?"),
            ],
        )
    } else if question.contains("want") || question.contains("would you like") {
        (
            vec![
                node("yes", &["please"]),
                node("no", &["thanks"]),
                node("maybe", &["later"]),
            ],
            vec![
                sentence("smart", "Yes please, that would be lovely."),
                sentence("casual", "Not right now, thanks."),
            ],
        )
    } else {
        (
            vec![
                node("yes", &["please", "definitely"]),
                node("no", &["thanks"]),
                node("I", &["think", "agree"]),
                node("can", &["you", "we"]),
            ],
            vec![
                sentence("smart", "Could you say that another way?"),
                sentence("casual", "Sure, sounds good."),
            ],
        )
    };

    // Once an answer is underway offer connectives rather than openers
    if !request.partial_answer.trim().is_empty() {
        forest = vec![
            node("and", &["you", "then"]),
            node("because", &["I"]),
            node("thanks", &[]),
        ];
    }

    forest.truncate(limit);
    Suggestions { forest, sentences }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(question: &str, partial: &str) -> SuggestionRequest {
        SuggestionRequest {
            question: question.into(),
            partial_answer: partial.into(),
            conversation: String::new(),
            suggestions_count: 5,
        }
    }

    #[tokio::test]
    async fn test_demo_answers_small_talk() {
        let source = DemoSuggestionSource::instant();
        let result = source.fetch(request("How are you", "")).await.unwrap();
        assert_eq!(result.forest[0].word, "good");
        assert_eq!(result.forest[0].children[0].word, "thanks");
        assert_eq!(result.sentences.len(), 3);
    }

    #[tokio::test]
    async fn test_partial_answer_switches_to_connectives() {
        let source = DemoSuggestionSource::instant();
        let result = source.fetch(request("How are you", "good")).await.unwrap();
        assert_eq!(result.forest[0].word, "and");
    }

    #[tokio::test]
    async fn test_count_limits_forest() {
        let source = DemoSuggestionSource::instant();
        let mut req = request("Anything", "");
        req.suggestions_count = 2;
        let result = source.fetch(req).await.unwrap();
        assert_eq!(result.forest.len(), 2);
    }
}

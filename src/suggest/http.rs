// Remote suggestion source
//
// POST {base}/suggest with {question, partial_answer, conversation,
// suggestions_count}; answer is {suggestions: [...], sentences: [...]}.

use super::{normalize_response, SuggestError, SuggestionRequest, SuggestionSource, Suggestions};
use crate::http::SharedHttpClient;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Suggestion source backed by the autocomplete HTTP service
pub struct HttpSuggestionSource {
    http: Arc<SharedHttpClient>,
    endpoint: String,
}

impl HttpSuggestionSource {
    pub fn new(http: Arc<SharedHttpClient>, base_url: &str) -> Self {
        let endpoint = format!("{}/suggest", base_url.trim_end_matches('/'));
        tracing::info!("Suggestion endpoint: {}", endpoint);
        Self { http, endpoint }
    }

    async fn post(&self, request: SuggestionRequest) -> Result<Suggestions, SuggestError> {
        let client = self
            .http
            .get()
            .await
            .map_err(|e| SuggestError::Network(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!(
            question = %request.question,
            partial_answer = %request.partial_answer,
            "requesting suggestions"
        );

        let response = client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| SuggestError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SuggestError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SuggestError::Decode(e.to_string()))?;

        Ok(normalize_response(&payload))
    }
}

impl SuggestionSource for HttpSuggestionSource {
    fn name(&self) -> &'static str {
        "http"
    }

    fn fetch(&self, request: SuggestionRequest) -> BoxFuture<'_, Result<Suggestions, SuggestError>> {
        Box::pin(self.post(request))
    }
}

// Mail-send collaborator
//
// POST {base}/agentmail/send with {to, subject, text, html?}; the service
// answers {success: bool, message?}. Anything but a 2xx with success=true is
// a rejection carrying the service message (or the HTTP status).

use crate::http::SharedHttpClient;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Outgoing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl MailMessage {
    /// Plain body plus a minimal HTML rendering (newlines become `<br>`)
    pub fn new(to: &str, subject: &str, text: &str) -> Self {
        let html = (!text.is_empty()).then(|| format!("<p>{}</p>", text.replace('\n', "<br>")));
        Self {
            to: to.to_string(),
            subject: subject.to_string(),
            text: text.to_string(),
            html,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    /// The request never got an answer
    Network(String),
    /// The service answered but did not accept the message
    Rejected(String),
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Rejected(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for MailError {}

/// Anything that can deliver a [`MailMessage`]
pub trait MailSender: Send + Sync {
    fn send(&self, message: MailMessage) -> BoxFuture<'_, Result<(), MailError>>;
}

/// HTTP mail-send client
pub struct MailClient {
    http: Arc<SharedHttpClient>,
    endpoint: String,
}

impl MailClient {
    pub fn new(http: Arc<SharedHttpClient>, base_url: &str) -> Self {
        let endpoint = format!("{}/agentmail/send", base_url.trim_end_matches('/'));
        tracing::info!("Mail endpoint: {}", endpoint);
        Self { http, endpoint }
    }

    async fn post(&self, message: MailMessage) -> Result<(), MailError> {
        let client = self
            .http
            .get()
            .await
            .map_err(|e| MailError::Network(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            text_length = message.text.len(),
            "Sending email"
        );

        let response = client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await
            .map_err(|e| MailError::Network(e.to_string()))?;

        let status = response.status();
        let body = match response.json::<SendResponse>().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!("Unable to parse mail response: {}", e);
                None
            }
        };

        match body {
            Some(SendResponse { success: true, .. }) if status.is_success() => Ok(()),
            Some(SendResponse {
                message: Some(message),
                ..
            }) => Err(MailError::Rejected(message)),
            _ => Err(MailError::Rejected(format!("HTTP {}", status.as_u16()))),
        }
    }
}

impl MailSender for MailClient {
    fn send(&self, message: MailMessage) -> BoxFuture<'_, Result<(), MailError>> {
        Box::pin(self.post(message))
    }
}

/// Demo mode: log the message and report success
#[derive(Debug, Default)]
pub struct DemoMailSender;

impl MailSender for DemoMailSender {
    fn send(&self, message: MailMessage) -> BoxFuture<'_, Result<(), MailError>> {
        Box::pin(async move {
            tracing::info!(to = %message.to, subject = %message.subject, "Demo mail accepted");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::time::Duration;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base: &str) -> MailClient {
        MailClient::new(Arc::new(SharedHttpClient::new(Duration::from_secs(5))), base)
    }

    #[test]
    fn test_html_body_keeps_line_breaks() {
        let message = MailMessage::new("a@b.c", "Hi", "one\ntwo");
        assert_eq!(message.html.as_deref(), Some("<p>one<br>two</p>"));
        assert_eq!(MailMessage::new("a@b.c", "Hi", "").html, None);
    }

    #[tokio::test]
    async fn test_successful_send() {
        let router = Router::new().route(
            "/agentmail/send",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["to"], "care@voicelink.ai");
                assert_eq!(body["subject"], "Hello");
                assert_eq!(body["text"], "Body");
                assert_eq!(body["html"], "<p>Body</p>");
                Json(json!({"success": true}))
            }),
        );
        let base = serve(router).await;
        let message = MailMessage::new("care@voicelink.ai", "Hello", "Body");
        assert_eq!(client(&base).send(message).await, Ok(()));
    }

    #[tokio::test]
    async fn test_rejection_carries_service_message() {
        let router = Router::new().route(
            "/agentmail/send",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"success": false, "message": "Invalid recipient"})),
                )
            }),
        );
        let base = serve(router).await;
        let result = client(&base)
            .send(MailMessage::new("x", "y", "z"))
            .await;
        assert_eq!(result, Err(MailError::Rejected("Invalid recipient".into())));
    }

    #[tokio::test]
    async fn test_unparseable_body_reports_status() {
        let router = Router::new().route(
            "/agentmail/send",
            post(|| async { (StatusCode::BAD_GATEWAY, "nope") }),
        );
        let base = serve(router).await;
        let result = client(&base)
            .send(MailMessage::new("x", "y", "z"))
            .await;
        assert_eq!(result, Err(MailError::Rejected("HTTP 502".into())));
    }

    #[tokio::test]
    async fn test_success_false_with_ok_status_is_rejected() {
        let router = Router::new().route(
            "/agentmail/send",
            post(|| async { Json(json!({"success": false})) }),
        );
        let base = serve(router).await;
        let result = client(&base)
            .send(MailMessage::new("x", "y", "z"))
            .await;
        assert_eq!(result, Err(MailError::Rejected("HTTP 200".into())));
    }
}

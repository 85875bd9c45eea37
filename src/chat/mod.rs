//! Chat assistant
//!
//! A free-text conversation with a completion endpoint that may ask for
//! tools (sending mail) before answering. One round of tool calls is
//! allowed per user message: the calls are run, their results appended,
//! and a final completion is requested without tools.
//!
//! The panel is a sync reducer like the navigator; the network round
//! trips run in [`converse`] on a spawned task.

pub mod demo;
pub mod http;
pub mod panel;
pub mod tools;

pub use demo::DemoChatClient;
pub use http::HttpChatClient;
pub use panel::{ChatPanel, ChatSnapshot};
pub use tools::MailTools;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Leads every conversation sent to the completion endpoint
pub const SYSTEM_PROMPT: &str = "You are an email assistant for a hands-free \
communication app. Keep answers short. When the user asks you to send an \
email, call send_email with a clear subject and body. After a tool runs, \
tell the user what happened.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ChatMessage {
    fn plain(role: ChatRole, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn system(content: &str) -> Self {
        Self::plain(ChatRole::System, content)
    }

    pub fn user(content: &str) -> Self {
        Self::plain(ChatRole::User, content)
    }

    pub fn assistant(content: &str) -> Self {
        Self::plain(ChatRole::Assistant, content)
    }

    /// The assistant turn that asked for tools
    pub fn tool_request(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::plain(ChatRole::Assistant, "")
        }
    }

    /// A tool's JSON result, answering `call_id`
    pub fn tool_result(call_id: &str, result: &Value) -> Self {
        Self {
            tool_call_id: Some(call_id.to_string()),
            ..Self::plain(ChatRole::Tool, &result.to_string())
        }
    }
}

/// A tool the model may call, described by a JSON schema
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// One completion: either an answer or a batch of tool calls
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Text(String),
    ToolCalls(Vec<ToolCall>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Request never produced a response
    Network(String),
    /// Endpoint answered with a non-2xx status
    Status { status: u16, message: String },
    /// Body was not a completion
    Decode(String),
    /// Completion had neither text nor tool calls
    Empty,
    /// The model asked for tools again after the tool round
    ToolLoop,
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Status { status, message } => {
                write!(f, "Chat request failed ({}): {}", status, message)
            }
            Self::Decode(msg) => write!(f, "Invalid chat response: {}", msg),
            Self::Empty => write!(f, "Empty response received"),
            Self::ToolLoop => write!(f, "Assistant kept asking for tools"),
        }
    }
}

impl std::error::Error for ChatError {}

/// Anything that can complete a conversation
pub trait ChatClient: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// `tools` empty means the model must answer in text
    fn complete(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolSpec>,
    ) -> BoxFuture<'_, Result<Completion, ChatError>>;
}

/// Executes the tools offered to the model
pub trait ToolRunner: Send + Sync {
    fn specs(&self) -> Vec<ToolSpec>;

    /// Always answers; failures are reported inside the JSON result
    fn run(&self, call: ToolCall) -> BoxFuture<'_, Value>;
}

/// Answer the latest user turn in `history`, running at most one round of
/// tool calls
pub async fn converse(
    client: &dyn ChatClient,
    tools: &dyn ToolRunner,
    history: Vec<ChatMessage>,
) -> Result<String, ChatError> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    messages.extend(history);

    let calls = match client.complete(messages.clone(), tools.specs()).await? {
        Completion::Text(text) => return non_empty(text),
        Completion::ToolCalls(calls) => calls,
    };

    tracing::info!(client = client.name(), count = calls.len(), "Running tool calls");
    messages.push(ChatMessage::tool_request(calls.clone()));
    for call in calls {
        let id = call.id.clone();
        let result = tools.run(call).await;
        messages.push(ChatMessage::tool_result(&id, &result));
    }

    match client.complete(messages, Vec::new()).await? {
        Completion::Text(text) => non_empty(text),
        Completion::ToolCalls(_) => Err(ChatError::ToolLoop),
    }
}

fn non_empty(text: String) -> Result<String, ChatError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ChatError::Empty)
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays scripted completions and records what it was sent
    struct Scripted {
        replies: Mutex<Vec<Completion>>,
        seen: Mutex<Vec<(Vec<ChatMessage>, usize)>>,
    }

    impl Scripted {
        fn new(mut replies: Vec<Completion>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChatClient for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn complete(
            &self,
            messages: Vec<ChatMessage>,
            tools: Vec<ToolSpec>,
        ) -> BoxFuture<'_, Result<Completion, ChatError>> {
            self.seen.lock().unwrap().push((messages, tools.len()));
            let reply = self.replies.lock().unwrap().pop().ok_or(ChatError::Empty);
            Box::pin(async move { reply })
        }
    }

    struct Echo;

    impl ToolRunner for Echo {
        fn specs(&self) -> Vec<ToolSpec> {
            vec![ToolSpec {
                name: "echo",
                description: "Echo the arguments",
                parameters: json!({"type": "object"}),
            }]
        }

        fn run(&self, call: ToolCall) -> BoxFuture<'_, Value> {
            Box::pin(async move { json!({"success": true, "echo": call.arguments}) })
        }
    }

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: "echo".into(),
            arguments: json!({"x": 1}),
        }
    }

    #[tokio::test]
    async fn test_text_reply_skips_tools() {
        let client = Scripted::new(vec![Completion::Text("  Hello there ".into())]);
        let reply = converse(&client, &Echo, vec![ChatMessage::user("hi")]).await;
        assert_eq!(reply, Ok("Hello there".to_string()));

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0[0].role, ChatRole::System);
        assert_eq!(seen[0].0[1], ChatMessage::user("hi"));
        assert_eq!(seen[0].1, 1);
    }

    #[tokio::test]
    async fn test_tool_round_then_final_answer_without_tools() {
        let client = Scripted::new(vec![
            Completion::ToolCalls(vec![call("a"), call("b")]),
            Completion::Text("Sent it.".into()),
        ]);
        let reply = converse(&client, &Echo, vec![ChatMessage::user("send")]).await;
        assert_eq!(reply, Ok("Sent it.".to_string()));

        let seen = client.seen.lock().unwrap();
        let (second, tool_count) = &seen[1];
        assert_eq!(*tool_count, 0);
        // system, user, tool request, two results
        assert_eq!(second.len(), 5);
        assert_eq!(second[2].tool_calls.len(), 2);
        assert_eq!(second[3].role, ChatRole::Tool);
        assert_eq!(second[3].tool_call_id.as_deref(), Some("a"));
        assert_eq!(second[4].tool_call_id.as_deref(), Some("b"));
        let result: Value = serde_json::from_str(&second[3].content).unwrap();
        assert_eq!(result["echo"]["x"], 1);
    }

    #[tokio::test]
    async fn test_second_tool_request_is_an_error() {
        let client = Scripted::new(vec![
            Completion::ToolCalls(vec![call("a")]),
            Completion::ToolCalls(vec![call("b")]),
        ]);
        let reply = converse(&client, &Echo, vec![ChatMessage::user("loop")]).await;
        assert_eq!(reply, Err(ChatError::ToolLoop));
    }

    #[tokio::test]
    async fn test_blank_text_is_empty_error() {
        let client = Scripted::new(vec![Completion::Text("   ".into())]);
        let reply = converse(&client, &Echo, vec![ChatMessage::user("hi")]).await;
        assert_eq!(reply, Err(ChatError::Empty));
    }
}

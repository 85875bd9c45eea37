// Demo mode: an offline assistant that can still drive the tool round
//
// Asking to "email" or "mail" someone turns into a send_email call with the
// message as the body; anything else gets a short canned answer.

use super::{ChatClient, ChatError, ChatMessage, ChatRole, Completion, ToolCall, ToolSpec};
use futures::future::BoxFuture;
use serde_json::{json, Value};

#[derive(Debug, Default)]
pub struct DemoChatClient;

impl DemoChatClient {
    fn answer(messages: &[ChatMessage], tools: &[ToolSpec]) -> Completion {
        let Some(last) = messages.last() else {
            return Completion::Text(String::new());
        };

        if last.role == ChatRole::Tool {
            let result: Value = serde_json::from_str(&last.content).unwrap_or_default();
            let text = match (result["message"].as_str(), result["error"].as_str()) {
                (Some(message), _) => format!("Done. {}.", message),
                (None, Some(error)) => format!("That didn't work: {}", error),
                _ => "Done.".to_string(),
            };
            return Completion::Text(text);
        }

        let lower = last.content.to_lowercase();
        let wants_mail = lower.contains("email") || lower.contains("mail");
        if wants_mail && tools.iter().any(|t| t.name == "send_email") {
            return Completion::ToolCalls(vec![ToolCall {
                id: "demo_call_1".to_string(),
                name: "send_email".to_string(),
                arguments: json!({
                    "subject": "Message from VoiceLink",
                    "text": last.content,
                }),
            }]);
        }

        Completion::Text(format!(
            "You said \"{}\". Ask me to email someone and I'll send it for you.",
            last.content
        ))
    }
}

impl ChatClient for DemoChatClient {
    fn name(&self) -> &'static str {
        "demo"
    }

    fn complete(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolSpec>,
    ) -> BoxFuture<'_, Result<Completion, ChatError>> {
        Box::pin(async move { Ok(Self::answer(&messages, &tools)) })
    }
}

// Tools offered to the chat assistant
//
// send_email{recipient?, subject, text} goes through the same mail sender
// agent mode uses. Results are JSON objects with `success` plus either a
// `message` or an `error`; a failing tool never fails the conversation.

use super::{ToolCall, ToolRunner, ToolSpec};
use crate::agent::mail::DEFAULT_RECIPIENT;
use crate::agent::{MailMessage, MailSender};
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct SendEmailArgs {
    recipient: Option<String>,
    subject: String,
    text: String,
}

pub struct MailTools {
    mailer: Arc<dyn MailSender>,
}

impl MailTools {
    pub fn new(mailer: Arc<dyn MailSender>) -> Self {
        Self { mailer }
    }

    async fn send_email(&self, arguments: Value) -> Value {
        let args: SendEmailArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return failure(format!("Invalid send_email arguments: {}", e)),
        };
        let to = args
            .recipient
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RECIPIENT.to_string());

        match self
            .mailer
            .send(MailMessage::new(&to, &args.subject, &args.text))
            .await
        {
            Ok(()) => json!({"success": true, "message": format!("Email sent to {}", to)}),
            Err(e) => failure(e.to_string()),
        }
    }
}

fn failure(error: String) -> Value {
    tracing::warn!("Tool call failed: {}", error);
    json!({"success": false, "error": error})
}

impl ToolRunner for MailTools {
    fn specs(&self) -> Vec<ToolSpec> {
        vec![ToolSpec {
            name: "send_email",
            description: "Send an email. Omit recipient to use the default contact.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "recipient": {"type": "string", "description": "Email address"},
                    "subject": {"type": "string"},
                    "text": {"type": "string", "description": "Plain text body"}
                },
                "required": ["subject", "text"]
            }),
        }]
    }

    fn run(&self, call: ToolCall) -> BoxFuture<'_, Value> {
        Box::pin(async move {
            tracing::info!(tool = %call.name, id = %call.id, "Tool call");
            match call.name.as_str() {
                "send_email" => self.send_email(call.arguments).await,
                other => failure(format!("Unknown function: {}", other)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MailError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<MailMessage>>,
        reject: bool,
    }

    impl MailSender for Outbox {
        fn send(&self, message: MailMessage) -> BoxFuture<'_, Result<(), MailError>> {
            self.sent.lock().unwrap().push(message);
            let result = if self.reject {
                Err(MailError::Rejected("Invalid recipient".into()))
            } else {
                Ok(())
            };
            Box::pin(async move { result })
        }
    }

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments,
        }
    }

    #[tokio::test]
    async fn test_send_email_uses_default_recipient() {
        let outbox = Arc::new(Outbox::default());
        let tools = MailTools::new(outbox.clone());
        let result = tools
            .run(call("send_email", json!({"subject": "Late", "text": "Running late"})))
            .await;

        assert_eq!(result["success"], true);
        let sent = outbox.sent.lock().unwrap();
        assert_eq!(sent[0].to, DEFAULT_RECIPIENT);
        assert_eq!(sent[0].subject, "Late");
        assert_eq!(sent[0].text, "Running late");
    }

    #[tokio::test]
    async fn test_rejection_and_bad_arguments_become_error_results() {
        let outbox = Arc::new(Outbox {
            reject: true,
            ..Outbox::default()
        });
        let tools = MailTools::new(outbox.clone());

        let rejected = tools
            .run(call("send_email", json!({"recipient": "x", "subject": "s", "text": "t"})))
            .await;
        assert_eq!(rejected, json!({"success": false, "error": "Invalid recipient"}));

        let malformed = tools.run(call("send_email", json!({"subject": 3}))).await;
        assert_eq!(malformed["success"], false);
        assert_eq!(outbox.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let tools = MailTools::new(Arc::new(Outbox::default()));
        let result = tools.run(call("get_all_emails", json!({}))).await;
        assert_eq!(result["error"], "Unknown function: get_all_emails");
    }
}

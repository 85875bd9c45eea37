// Remote chat completions
//
// POST {base}/chat/completions with {model, messages, tools?, tool_choice?}
// in the OpenAI-compatible shape. Tool arguments travel as JSON strings on
// the wire and are parsed here; the answer is read from choices[0].message.

use super::{ChatClient, ChatError, ChatMessage, Completion, ToolCall, ToolSpec};
use crate::http::SharedHttpClient;
use futures::future::BoxFuture;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub struct HttpChatClient {
    http: Arc<SharedHttpClient>,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpChatClient {
    pub fn new(
        http: Arc<SharedHttpClient>,
        base_url: &str,
        model: &str,
        api_key: Option<String>,
    ) -> Self {
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        tracing::info!("Chat endpoint: {} (model {})", endpoint, model);
        Self {
            http,
            endpoint,
            model: model.to_string(),
            api_key,
        }
    }

    fn body(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages.iter().map(wire_message).collect::<Vec<_>>(),
        });
        if !tools.is_empty() {
            body["tools"] = tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        }
                    })
                })
                .collect();
            body["tool_choice"] = json!("auto");
        }
        body
    }

    async fn post(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolSpec>,
    ) -> Result<Completion, ChatError> {
        let client = self
            .http
            .get()
            .await
            .map_err(|e| ChatError::Network(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!(
            messages = messages.len(),
            tools = tools.len(),
            "requesting chat completion"
        );

        let mut request = client.post(&self.endpoint).json(&self.body(&messages, &tools));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ChatError::Decode(e.to_string()))?;

        parse_completion(&payload)
    }
}

impl ChatClient for HttpChatClient {
    fn name(&self) -> &'static str {
        "http"
    }

    fn complete(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolSpec>,
    ) -> BoxFuture<'_, Result<Completion, ChatError>> {
        Box::pin(self.post(messages, tools))
    }
}

fn wire_message(message: &ChatMessage) -> Value {
    let mut wire = Map::new();
    wire.insert("role".into(), json!(message.role));
    wire.insert("content".into(), json!(message.content));
    if let Some(id) = &message.tool_call_id {
        wire.insert("tool_call_id".into(), json!(id));
    }
    if !message.tool_calls.is_empty() {
        let calls: Vec<Value> = message
            .tool_calls
            .iter()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.arguments.to_string(),
                    }
                })
            })
            .collect();
        wire.insert("tool_calls".into(), Value::Array(calls));
    }
    Value::Object(wire)
}

fn parse_completion(payload: &Value) -> Result<Completion, ChatError> {
    let message = &payload["choices"][0]["message"];
    if !message.is_object() {
        return Err(ChatError::Decode("missing choices[0].message".into()));
    }

    if let Some(calls) = message["tool_calls"].as_array().filter(|c| !c.is_empty()) {
        return calls
            .iter()
            .map(parse_tool_call)
            .collect::<Result<Vec<_>, _>>()
            .map(Completion::ToolCalls);
    }

    match message["content"].as_str() {
        Some(text) if !text.trim().is_empty() => Ok(Completion::Text(text.to_string())),
        _ => Err(ChatError::Empty),
    }
}

fn parse_tool_call(call: &Value) -> Result<ToolCall, ChatError> {
    let id = call["id"].as_str().unwrap_or_default();
    let Some(name) = call["function"]["name"].as_str() else {
        return Err(ChatError::Decode("tool call without a function name".into()));
    };
    let raw = call["function"]["arguments"].as_str().unwrap_or_default();
    let arguments = if raw.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str(raw)
            .map_err(|e| ChatError::Decode(format!("arguments for {}: {}", name, e)))?
    };
    Ok(ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{converse, ToolRunner};
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use std::sync::Mutex;
    use std::time::Duration;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base: &str, api_key: Option<&str>) -> HttpChatClient {
        HttpChatClient::new(
            Arc::new(SharedHttpClient::new(Duration::from_secs(5))),
            base,
            "asi1-mini",
            api_key.map(str::to_string),
        )
    }

    /// Records every call and answers with a fixed result
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<ToolCall>>,
    }

    impl ToolRunner for Recorder {
        fn specs(&self) -> Vec<ToolSpec> {
            vec![ToolSpec {
                name: "send_email",
                description: "Send an email",
                parameters: json!({"type": "object"}),
            }]
        }

        fn run(&self, call: ToolCall) -> BoxFuture<'_, Value> {
            self.calls.lock().unwrap().push(call);
            Box::pin(async { json!({"success": true, "message": "Email sent"}) })
        }
    }

    #[tokio::test]
    async fn test_text_reply() {
        let router = Router::new().route(
            "/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer secret");
                assert_eq!(body["model"], "asi1-mini");
                assert_eq!(body["messages"][0]["role"], "system");
                assert_eq!(body["messages"][1]["content"], "hello");
                assert_eq!(body["tool_choice"], "auto");
                assert_eq!(body["tools"][0]["function"]["name"], "send_email");
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "Hi! How can I help?"}}]
                }))
            }),
        );
        let base = serve(router).await;

        let tools = Recorder::default();
        let reply = converse(
            &client(&format!("{}/", base), Some("secret")),
            &tools,
            vec![ChatMessage::user("hello")],
        )
        .await;

        assert_eq!(reply, Ok("Hi! How can I help?".to_string()));
        assert!(tools.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tool_call_reply_runs_tool_and_resubmits() {
        let router = Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<Value>| async move {
                if body.get("tools").is_some() {
                    return Json(json!({
                        "choices": [{"message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_7",
                                "type": "function",
                                "function": {
                                    "name": "send_email",
                                    "arguments": "{\"subject\":\"Late\",\"text\":\"Running late\"}"
                                }
                            }]
                        }}]
                    }));
                }
                // Final round: no tools offered, tool result echoed back
                let messages = body["messages"].as_array().unwrap();
                let request = &messages[messages.len() - 2];
                let result = &messages[messages.len() - 1];
                assert!(body.get("tool_choice").is_none());
                assert_eq!(request["tool_calls"][0]["id"], "call_7");
                assert_eq!(request["tool_calls"][0]["function"]["name"], "send_email");
                assert_eq!(result["role"], "tool");
                assert_eq!(result["tool_call_id"], "call_7");
                let content: Value =
                    serde_json::from_str(result["content"].as_str().unwrap()).unwrap();
                assert_eq!(content["success"], true);
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "Done, I emailed Jordan."}}]
                }))
            }),
        );
        let base = serve(router).await;

        let tools = Recorder::default();
        let reply = converse(
            &client(&base, None),
            &tools,
            vec![ChatMessage::user("tell jordan I'm late")],
        )
        .await;

        assert_eq!(reply, Ok("Done, I emailed Jordan.".to_string()));
        let calls = tools.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "send_email");
        assert_eq!(calls[0].arguments["subject"], "Late");
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base = serve(router).await;

        match client(&base, None)
            .complete(vec![ChatMessage::user("hi")], Vec::new())
            .await
        {
            Err(ChatError::Status { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad key");
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_completion_edge_cases() {
        assert_eq!(
            parse_completion(&json!({"choices": []})),
            Err(ChatError::Decode("missing choices[0].message".into()))
        );
        assert_eq!(
            parse_completion(&json!({"choices": [{"message": {"content": ""}}]})),
            Err(ChatError::Empty)
        );
        // Empty argument strings mean no arguments
        assert_eq!(
            parse_completion(&json!({"choices": [{"message": {"tool_calls": [
                {"id": "c", "function": {"name": "get_inbox_info", "arguments": ""}}
            ]}}]})),
            Ok(Completion::ToolCalls(vec![ToolCall {
                id: "c".into(),
                name: "get_inbox_info".into(),
                arguments: json!({}),
            }]))
        );
        assert!(matches!(
            parse_completion(&json!({"choices": [{"message": {"tool_calls": [
                {"id": "c", "function": {"name": "send_email", "arguments": "{oops"}}
            ]}}]})),
            Err(ChatError::Decode(_))
        ));
    }
}

//! OpenAI backend: chat completions with tool calling, plus embeddings.
//!
//! Speaks the `/v1/chat/completions` and `/v1/embeddings` wire format.
//! Tool-call arguments arrive as a JSON-encoded string and are parsed into
//! a structured value before they reach the orchestrator.

use agentforge_core::error::ProviderError;
use agentforge_core::message::{ChatMessage, Role, ToolCallRecord};
use agentforge_core::provider::{
    CompletionProvider, CompletionRequest, CompletionResponse, EmbeddingClient, Usage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat-completions and embeddings client.
///
/// Holds the decrypted API key for the lifetime of one request path; the key
/// never appears in `Debug` output or error messages.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeout)
    }

    /// Point at a compatible endpoint, used by tests against local mocks.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded argument object.
    arguments: String,
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionDef,
}

#[derive(Serialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Deserialize)]
struct WireResponse {
    model: Option<String>,
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Serialize)]
struct EmbeddingWireRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingWireResponse {
    data: Vec<EmbeddingWireItem>,
}

#[derive(Deserialize)]
struct EmbeddingWireItem {
    index: usize,
    embedding: Vec<f32>,
}

// --- Conversions ---

fn to_wire_messages(messages: &[ChatMessage]) -> Vec<WireMessage> {
    messages
        .iter()
        .map(|m| match m.role {
            Role::System => WireMessage {
                role: "system".into(),
                content: Some(m.content.clone()),
                tool_calls: None,
                tool_call_id: None,
            },
            Role::User => WireMessage {
                role: "user".into(),
                content: Some(m.content.clone()),
                tool_calls: None,
                tool_call_id: None,
            },
            Role::Assistant => {
                let tool_calls = if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|c| WireToolCall {
                                id: c.id.clone(),
                                kind: "function".into(),
                                function: WireFunctionCall {
                                    name: c.tool.clone(),
                                    arguments: c.inputs.to_string(),
                                },
                            })
                            .collect(),
                    )
                };
                WireMessage {
                    role: "assistant".into(),
                    content: if m.content.is_empty() && tool_calls.is_some() {
                        None
                    } else {
                        Some(m.content.clone())
                    },
                    tool_calls,
                    tool_call_id: None,
                }
            }
            Role::Tool => WireMessage {
                role: "tool".into(),
                content: Some(m.content.clone()),
                tool_calls: None,
                tool_call_id: m.tool_call_id.clone(),
            },
        })
        .collect()
}

fn parse_assistant_message(wire: WireMessage) -> ChatMessage {
    let mut message = ChatMessage::assistant(wire.content.unwrap_or_default());
    if let Some(calls) = wire.tool_calls {
        for call in calls {
            let inputs = serde_json::from_str(&call.function.arguments).unwrap_or_else(|e| {
                warn!(tool = %call.function.name, error = %e, "Unparseable tool-call arguments");
                serde_json::json!({})
            });
            message.tool_calls.push(ToolCallRecord {
                id: call.id,
                tool: call.function.name,
                inputs,
            });
        }
    }
    message
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let requested_model = request.model.clone();
        let wire = WireRequest {
            model: request.model,
            messages: to_wire_messages(&request.messages),
            tools: if request.tools.is_empty() {
                None
            } else {
                Some(
                    request
                        .tools
                        .into_iter()
                        .map(|t| WireTool {
                            kind: "function".into(),
                            function: WireFunctionDef {
                                name: t.name,
                                description: t.description,
                                parameters: t.parameters,
                            },
                        })
                        .collect(),
                )
            },
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(model = %requested_model, messages = wire.messages.len(), "OpenAI completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&wire)
            .send()
            .await
            .map_err(crate::map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(crate::map_status_error(status, retry_after, body));
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(format!("malformed response body: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Network("response contained no choices".into()))?;

        Ok(CompletionResponse {
            message: parse_assistant_message(choice.message),
            model: parsed.model.unwrap_or(requested_model),
            usage: parsed.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed(&self, inputs: &[String], model: &str) -> Result<Vec<Vec<f32>>, ProviderError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingWireRequest { model, input: inputs })
            .send()
            .await
            .map_err(crate::map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(crate::map_status_error(status, None, body));
        }

        let parsed: EmbeddingWireResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(format!("malformed response body: {e}")))?;

        // The API is documented to preserve input order; sort by index anyway.
        let mut items = parsed.data;
        items.sort_by_key(|i| i.index);
        if items.len() != inputs.len() {
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: format!(
                    "embedding count mismatch: sent {}, received {}",
                    inputs.len(),
                    items.len()
                ),
            });
        }
        Ok(items.into_iter().map(|i| i.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentforge_core::provider::ToolDefinition;
    use serde_json::json;

    #[test]
    fn tool_turn_maps_to_wire_tool_role() {
        let messages = vec![
            ChatMessage::system("You are helpful."),
            ChatMessage::user("check my balance"),
            ChatMessage::tool_result("call_1", r#"{"balance":120}"#),
        ];
        let wire = to_wire_messages(&messages);
        assert_eq!(wire[0].role, "system");
        assert_eq!(wire[2].role, "tool");
        assert_eq!(wire[2].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn assistant_tool_calls_serialize_arguments_as_string() {
        let mut msg = ChatMessage::assistant("");
        msg.tool_calls.push(ToolCallRecord {
            id: "call_1".into(),
            tool: "checkBalance".into(),
            inputs: json!({"userId": "7"}),
        });
        let wire = to_wire_messages(&[msg]);
        let calls = wire[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "checkBalance");
        let args: serde_json::Value = serde_json::from_str(&calls[0].function.arguments).unwrap();
        assert_eq!(args["userId"], "7");
        // Empty content with tool calls is omitted entirely
        assert!(wire[0].content.is_none());
    }

    #[test]
    fn response_tool_calls_parse_into_records() {
        let wire: WireMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_abc",
                "type": "function",
                "function": {"name": "checkBalance", "arguments": "{\"userId\":\"7\"}"}
            }]
        }))
        .unwrap();
        let msg = parse_assistant_message(wire);
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.tool_calls[0].inputs["userId"], "7");
    }

    #[test]
    fn unparseable_arguments_fall_back_to_empty_object() {
        let wire: WireMessage = serde_json::from_value(json!({
            "role": "assistant",
            "tool_calls": [{
                "id": "call_abc",
                "type": "function",
                "function": {"name": "checkBalance", "arguments": "{not json"}
            }]
        }))
        .unwrap();
        let msg = parse_assistant_message(wire);
        assert_eq!(msg.tool_calls[0].inputs, json!({}));
    }

    #[test]
    fn tool_definitions_attach_under_function_envelope() {
        let request = CompletionRequest {
            model: "gpt-4o".into(),
            messages: vec![ChatMessage::user("hi")],
            tools: vec![ToolDefinition {
                name: "checkBalance".into(),
                description: "Check balance".into(),
                parameters: json!({"type": "object", "properties": {}}),
            }],
            temperature: 0.7,
            max_tokens: None,
        };
        // Serialize the same shape complete() would send.
        let wire = WireRequest {
            model: request.model,
            messages: to_wire_messages(&request.messages),
            tools: Some(
                request
                    .tools
                    .into_iter()
                    .map(|t| WireTool {
                        kind: "function".into(),
                        function: WireFunctionDef {
                            name: t.name,
                            description: t.description,
                            parameters: t.parameters,
                        },
                    })
                    .collect(),
            ),
            temperature: request.temperature,
            max_tokens: None,
        };
        let value = serde_json::to_value(&wire).unwrap();
        assert_eq!(value["tools"][0]["type"], "function");
        assert_eq!(value["tools"][0]["function"]["name"], "checkBalance");
    }

    #[test]
    fn debug_never_prints_api_key() {
        let provider = OpenAiProvider::new("sk-secret-key", Duration::from_secs(1));
        let dbg = format!("{provider:?}");
        assert!(!dbg.contains("sk-secret-key"));
    }
}

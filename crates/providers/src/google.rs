//! Google Gemini backend: `generateContent` with function calling, plus
//! `batchEmbedContents` embeddings.
//!
//! Gemini has no tool-call IDs, so synthetic IDs are assigned per response
//! and function responses are matched by function name. The API key travels
//! in the `x-goog-api-key` header, never in the URL.

use agentforge_core::error::ProviderError;
use agentforge_core::message::{ChatMessage, Role, ToolCallRecord};
use agentforge_core::provider::{
    CompletionProvider, CompletionRequest, CompletionResponse, EmbeddingClient, Usage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini completion and embedding client.
pub struct GoogleProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl GoogleProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeout)
    }

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
#[serde(rename_all = "camelCase")]
struct WireRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireToolList>>,
    generation_config: WireGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<WirePart>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<WireFunctionResponse>,
}

impl WirePart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            function_call: None,
            function_response: None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    args: serde_json::Value,
}

#[derive(Serialize, Deserialize)]
struct WireFunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireToolList {
    function_declarations: Vec<WireFunctionDecl>,
}

#[derive(Serialize)]
struct WireFunctionDecl {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    usage_metadata: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireCandidate {
    content: Option<WireContent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    content: WireContent,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbedValues>,
}

#[derive(Deserialize)]
struct EmbedValues {
    values: Vec<f32>,
}

// --- Conversions ---

/// Split the transcript into a system instruction and alternating contents.
fn to_wire_contents(messages: &[ChatMessage]) -> (Option<WireContent>, Vec<WireContent>) {
    let mut system: Option<WireContent> = None;
    let mut contents = Vec::new();

    for m in messages {
        match m.role {
            Role::System => {
                system = Some(WireContent {
                    role: None,
                    parts: vec![WirePart::text(&m.content)],
                });
            }
            Role::User => contents.push(WireContent {
                role: Some("user".into()),
                parts: vec![WirePart::text(&m.content)],
            }),
            Role::Assistant => {
                let mut parts = Vec::new();
                if !m.content.is_empty() {
                    parts.push(WirePart::text(&m.content));
                }
                for call in &m.tool_calls {
                    parts.push(WirePart {
                        text: None,
                        function_call: Some(WireFunctionCall {
                            name: call.tool.clone(),
                            args: call.inputs.clone(),
                        }),
                        function_response: None,
                    });
                }
                if parts.is_empty() {
                    parts.push(WirePart::text(""));
                }
                contents.push(WireContent {
                    role: Some("model".into()),
                    parts,
                });
            }
            Role::Tool => {
                // Gemini matches responses by function name; the orchestrator
                // attaches the originating result record to the tool turn.
                let name = m
                    .tool_results
                    .first()
                    .map(|r| r.tool.clone())
                    .unwrap_or_else(|| "tool".into());
                let response = match serde_json::from_str::<serde_json::Value>(&m.content) {
                    Ok(v) if v.is_object() => v,
                    _ => serde_json::json!({ "result": m.content }),
                };
                contents.push(WireContent {
                    role: Some("user".into()),
                    parts: vec![WirePart {
                        text: None,
                        function_call: None,
                        function_response: Some(WireFunctionResponse { name, response }),
                    }],
                });
            }
        }
    }

    (system, contents)
}

fn parse_candidate(content: WireContent) -> ChatMessage {
    let mut text = String::new();
    let mut message = ChatMessage::assistant("");
    for (idx, part) in content.parts.into_iter().enumerate() {
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(call) = part.function_call {
            message.tool_calls.push(ToolCallRecord {
                id: format!("call_{idx}"),
                tool: call.name,
                inputs: call.args,
            });
        }
    }
    message.content = text;
    message
}

#[async_trait]
impl CompletionProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let (system_instruction, contents) = to_wire_contents(&request.messages);
        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(vec![WireToolList {
                function_declarations: request
                    .tools
                    .into_iter()
                    .map(|t| WireFunctionDecl {
                        name: t.name,
                        description: t.description,
                        parameters: t.parameters,
                    })
                    .collect(),
            }])
        };
        let wire = WireRequest {
            system_instruction,
            contents,
            tools,
            generation_config: WireGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        debug!(model = %request.model, contents = wire.contents.len(), "Gemini completion request");

        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
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

        let content = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or_else(|| ProviderError::Network("response contained no candidates".into()))?;

        Ok(CompletionResponse {
            message: parse_candidate(content),
            model: request.model,
            usage: parsed.usage_metadata.map(|u| Usage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
        })
    }
}

#[async_trait]
impl EmbeddingClient for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn embed(&self, inputs: &[String], model: &str) -> Result<Vec<Vec<f32>>, ProviderError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let wire = BatchEmbedRequest {
            requests: inputs
                .iter()
                .map(|text| EmbedRequest {
                    model: format!("models/{model}"),
                    content: WireContent {
                        role: None,
                        parts: vec![WirePart::text(text)],
                    },
                })
                .collect(),
        };

        let url = format!("{}/models/{}:batchEmbedContents", self.base_url, model);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&wire)
            .send()
            .await
            .map_err(crate::map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(crate::map_status_error(status, None, body));
        }

        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(format!("malformed response body: {e}")))?;

        if parsed.embeddings.len() != inputs.len() {
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: format!(
                    "embedding count mismatch: sent {}, received {}",
                    inputs.len(),
                    parsed.embeddings.len()
                ),
            });
        }
        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}

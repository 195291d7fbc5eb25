//! Completion and embedding capability traits.
//!
//! A `CompletionProvider` knows how to send a transcript plus tool
//! definitions to an LLM and return the assistant's message, which may carry
//! tool calls. An `EmbeddingClient` turns text into vectors; the same
//! client is used at ingestion and query time so embedding spaces match.

use crate::error::ProviderError;
use crate::message::ChatMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A tool definition sent to the LLM so it knows what actions it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A uniform completion request, provider-agnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "gpt-4o", "gemini-1.5-pro")
    pub model: String,

    /// The transcript, system message first.
    pub messages: Vec<ChatMessage>,

    /// Tools the model may call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The assistant message, possibly carrying tool calls.
    pub message: ChatMessage,

    /// Which model actually responded.
    pub model: String,

    pub usage: Option<Usage>,
}

/// The uniform completion interface every LLM backend implements.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// A human-readable provider name (e.g., "openai", "google").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;
}

/// The embedding capability: `embed(texts, model) → vectors`, one vector
/// per input, in input order.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    fn name(&self) -> &str;

    async fn embed(
        &self,
        inputs: &[String],
        model: &str,
    ) -> std::result::Result<Vec<Vec<f32>>, ProviderError>;
}

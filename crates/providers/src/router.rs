//! Provider-keyed construction of completion and embedding backends.
//!
//! Agents name their provider; the router turns that name plus a decrypted
//! API key into a live client. Completion and embedding clients carry
//! separate timeouts because embedding batches behave differently from
//! long-running chat completions.

use crate::{GoogleProvider, OpenAiProvider};
use agentforge_core::agent::LlmProvider;
use agentforge_core::provider::{CompletionProvider, EmbeddingClient};
use std::sync::Arc;
use std::time::Duration;

/// Builds provider clients for an agent's configured backend.
#[derive(Debug, Clone)]
pub struct ProviderRouter {
    llm_timeout: Duration,
    embedding_timeout: Duration,
}

impl Default for ProviderRouter {
    fn default() -> Self {
        Self {
            llm_timeout: Duration::from_secs(120),
            embedding_timeout: Duration::from_secs(60),
        }
    }
}

impl ProviderRouter {
    pub fn new(llm_timeout: Duration, embedding_timeout: Duration) -> Self {
        Self {
            llm_timeout,
            embedding_timeout,
        }
    }

    /// Build a completion client for `provider` bound to `api_key`.
    pub fn completion(&self, provider: LlmProvider, api_key: &str) -> Arc<dyn CompletionProvider> {
        match provider {
            LlmProvider::OpenAi => Arc::new(OpenAiProvider::new(api_key, self.llm_timeout)),
            LlmProvider::Google => Arc::new(GoogleProvider::new(api_key, self.llm_timeout)),
        }
    }

    /// Build an embedding client for `provider` bound to `api_key`.
    pub fn embedder(&self, provider: LlmProvider, api_key: &str) -> Arc<dyn EmbeddingClient> {
        match provider {
            LlmProvider::OpenAi => Arc::new(OpenAiProvider::new(api_key, self.embedding_timeout)),
            LlmProvider::Google => Arc::new(GoogleProvider::new(api_key, self.embedding_timeout)),
        }
    }
}

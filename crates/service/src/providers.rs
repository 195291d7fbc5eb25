//! Provider construction seam.
//!
//! The service asks for completion and embedding clients by provider name
//! plus decrypted key. Production wiring delegates to `ProviderRouter`;
//! tests substitute scripted clients.

use agentforge_core::agent::LlmProvider;
use agentforge_core::provider::{CompletionProvider, EmbeddingClient};
use agentforge_providers::ProviderRouter;
use std::sync::Arc;

pub trait ProviderFactory: Send + Sync {
    fn completion(&self, provider: LlmProvider, api_key: &str) -> Arc<dyn CompletionProvider>;

    fn embedder(&self, provider: LlmProvider, api_key: &str) -> Arc<dyn EmbeddingClient>;
}

impl ProviderFactory for ProviderRouter {
    fn completion(&self, provider: LlmProvider, api_key: &str) -> Arc<dyn CompletionProvider> {
        ProviderRouter::completion(self, provider, api_key)
    }

    fn embedder(&self, provider: LlmProvider, api_key: &str) -> Arc<dyn EmbeddingClient> {
        ProviderRouter::embedder(self, provider, api_key)
    }
}

//! Knowledge-context retrieval for chat turns.
//!
//! Bridges the orchestrator's `ContextRetriever` seam onto the knowledge
//! index: list the agent's knowledge bases, resolve an embedding client in
//! each base's pinned embedding space, and return the top hits. Retrieval is
//! best effort; an agent without a usable key or ready bases simply yields
//! no context.

use crate::providers::ProviderFactory;
use crate::repo::Repository;
use agentforge_agent::ContextRetriever;
use agentforge_core::agent::Agent;
use agentforge_core::error::IngestionError;
use agentforge_core::knowledge::ScoredChunk;
use agentforge_knowledge::{KnowledgeStore, SearchIndex};
use agentforge_security::KeyVault;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct KnowledgeContextRetriever {
    store: Arc<dyn KnowledgeStore>,
    index: SearchIndex,
    agents: Repository<Agent>,
    vault: Arc<KeyVault>,
    providers: Arc<dyn ProviderFactory>,
    top_k: usize,
}

impl KnowledgeContextRetriever {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        agents: Repository<Agent>,
        vault: Arc<KeyVault>,
        providers: Arc<dyn ProviderFactory>,
        top_k: usize,
    ) -> Self {
        Self {
            index: SearchIndex::new(store.clone()),
            store,
            agents,
            vault,
            providers,
            top_k,
        }
    }
}

#[async_trait]
impl ContextRetriever for KnowledgeContextRetriever {
    async fn retrieve(
        &self,
        agent_id: &str,
        query: &str,
    ) -> Result<Vec<ScoredChunk>, IngestionError> {
        let Some(agent) = self.agents.get(agent_id).await else {
            return Ok(Vec::new());
        };

        let api_key = if agent.api_key_enc.is_empty() {
            None
        } else {
            self.vault.decrypt(&agent.api_key_enc).ok()
        };

        let bases = self.store.list_for_agent(agent_id).await?;
        if bases.is_empty() {
            return Ok(Vec::new());
        }
        debug!(agent_id, bases = bases.len(), "Retrieving knowledge context");

        let providers = self.providers.clone();
        self.index
            .search(&bases, query, self.top_k, move |spec| {
                let provider = spec.provider.parse().ok()?;
                let key = api_key.as_deref()?;
                Some(providers.embedder(provider, key))
            })
            .await
    }
}

//! Knowledge base persistence.
//!
//! The store keeps knowledge base records, their raw uploaded bytes (so
//! embeddings can be built or rebuilt later), and the embedded chunks.
//! Replacing chunks is atomic per knowledge base.

use agentforge_core::error::IngestionError;
use agentforge_core::knowledge::{Chunk, KnowledgeBase};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage interface for knowledge bases, source documents and chunks.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn insert(&self, kb: KnowledgeBase) -> Result<(), IngestionError>;

    async fn get(&self, kb_id: &str) -> Result<Option<KnowledgeBase>, IngestionError>;

    /// Overwrite an existing record. Errors if the record vanished.
    async fn update(&self, kb: KnowledgeBase) -> Result<(), IngestionError>;

    /// Remove the record plus its source bytes and chunks.
    async fn delete(&self, kb_id: &str) -> Result<(), IngestionError>;

    async fn list_for_agent(&self, agent_id: &str) -> Result<Vec<KnowledgeBase>, IngestionError>;

    /// Keep the raw uploaded document for later embedding builds.
    async fn put_source(&self, kb_id: &str, bytes: Vec<u8>) -> Result<(), IngestionError>;

    async fn get_source(&self, kb_id: &str) -> Result<Vec<u8>, IngestionError>;

    /// Replace all chunks of a knowledge base in one step.
    async fn replace_chunks(&self, kb_id: &str, chunks: Vec<Chunk>) -> Result<(), IngestionError>;

    async fn chunks(&self, kb_id: &str) -> Result<Vec<Chunk>, IngestionError>;
}

#[derive(Default)]
struct StoreInner {
    records: HashMap<String, KnowledgeBase>,
    sources: HashMap<String, Vec<u8>>,
    chunks: HashMap<String, Vec<Chunk>>,
}

/// In-memory store backed by a `tokio::sync::RwLock`.
#[derive(Default, Clone)]
pub struct InMemoryKnowledgeStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn insert(&self, kb: KnowledgeBase) -> Result<(), IngestionError> {
        let mut inner = self.inner.write().await;
        inner.records.insert(kb.id.clone(), kb);
        Ok(())
    }

    async fn get(&self, kb_id: &str) -> Result<Option<KnowledgeBase>, IngestionError> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(kb_id).cloned())
    }

    async fn update(&self, kb: KnowledgeBase) -> Result<(), IngestionError> {
        let mut inner = self.inner.write().await;
        if !inner.records.contains_key(&kb.id) {
            return Err(IngestionError::NotFound(kb.id));
        }
        inner.records.insert(kb.id.clone(), kb);
        Ok(())
    }

    async fn delete(&self, kb_id: &str) -> Result<(), IngestionError> {
        let mut inner = self.inner.write().await;
        inner.records.remove(kb_id);
        inner.sources.remove(kb_id);
        inner.chunks.remove(kb_id);
        Ok(())
    }

    async fn list_for_agent(&self, agent_id: &str) -> Result<Vec<KnowledgeBase>, IngestionError> {
        let inner = self.inner.read().await;
        let mut list: Vec<KnowledgeBase> = inner
            .records
            .values()
            .filter(|kb| kb.agent_id == agent_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn put_source(&self, kb_id: &str, bytes: Vec<u8>) -> Result<(), IngestionError> {
        let mut inner = self.inner.write().await;
        inner.sources.insert(kb_id.to_string(), bytes);
        Ok(())
    }

    async fn get_source(&self, kb_id: &str) -> Result<Vec<u8>, IngestionError> {
        let inner = self.inner.read().await;
        inner
            .sources
            .get(kb_id)
            .cloned()
            .ok_or_else(|| IngestionError::Storage(format!("no source document for {kb_id}")))
    }

    async fn replace_chunks(&self, kb_id: &str, chunks: Vec<Chunk>) -> Result<(), IngestionError> {
        let mut inner = self.inner.write().await;
        inner.chunks.insert(kb_id.to_string(), chunks);
        Ok(())
    }

    async fn chunks(&self, kb_id: &str) -> Result<Vec<Chunk>, IngestionError> {
        let inner = self.inner.read().await;
        Ok(inner.chunks.get(kb_id).cloned().unwrap_or_default())
    }
}

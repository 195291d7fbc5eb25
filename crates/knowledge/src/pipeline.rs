//! The two-phase ingestion pipeline.
//!
//! `upload` is fast: it registers the document and returns an `UPLOADED`
//! record without touching the extractor or any provider. `build_embeddings`
//! is the expensive explicit step; it is idempotent (rebuilding replaces the
//! chunk set) and guarded so concurrent triggers for the same knowledge base
//! collapse into one run. Every run terminates in `READY` or `FAILED`.

use crate::chunker::chunk_text;
use crate::store::KnowledgeStore;
use agentforge_core::error::IngestionError;
use agentforge_core::extract::TextExtractor;
use agentforge_core::knowledge::{Chunk, EmbeddingSpec, KbStatus, KnowledgeBase};
use agentforge_core::provider::EmbeddingClient;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Drives knowledge bases through `UPLOADED → PROCESSING → READY | FAILED`.
pub struct IngestionPipeline {
    store: Arc<dyn KnowledgeStore>,
    extractor: Arc<dyn TextExtractor>,
    chunk_size: usize,
    chunk_overlap: usize,
    in_flight: Mutex<HashSet<String>>,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        extractor: Arc<dyn TextExtractor>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            store,
            extractor,
            chunk_size,
            chunk_overlap,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Register an uploaded document. No extraction or embedding happens here.
    pub async fn upload(
        &self,
        agent_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<KnowledgeBase, IngestionError> {
        let kb = KnowledgeBase::uploaded(agent_id, file_name);
        self.store.insert(kb.clone()).await?;
        self.store.put_source(&kb.id, bytes).await?;
        info!(kb_id = %kb.id, agent_id, file_name, "Knowledge base uploaded");
        Ok(kb)
    }

    /// Extract, chunk and embed one knowledge base. Returns the record in its
    /// terminal state. A trigger while a build is already running is a no-op
    /// returning the current record.
    pub async fn build_embeddings(
        &self,
        kb_id: &str,
        embedder: Arc<dyn EmbeddingClient>,
        spec: EmbeddingSpec,
    ) -> Result<KnowledgeBase, IngestionError> {
        let mut kb = self
            .store
            .get(kb_id)
            .await?
            .ok_or_else(|| IngestionError::NotFound(kb_id.to_string()))?;

        {
            let mut guard = self.in_flight.lock().await;
            if kb.status == KbStatus::Processing || !guard.insert(kb_id.to_string()) {
                return Ok(kb);
            }
        }

        kb.status = KbStatus::Processing;
        kb.failure = None;
        kb.updated_at = Utc::now();
        if let Err(e) = self.store.update(kb.clone()).await {
            self.in_flight.lock().await.remove(kb_id);
            return Err(e);
        }

        let outcome = self.run_build(&kb, embedder, &spec).await;

        // No early return below this point: the record must leave PROCESSING
        // and the in-flight slot must be released on every path.
        let result = match outcome {
            Ok(chunk_count) => {
                kb.status = KbStatus::Ready;
                kb.chunk_count = chunk_count;
                kb.embedding = Some(spec);
                kb.failure = None;
                kb.updated_at = Utc::now();
                match self.store.update(kb.clone()).await {
                    Ok(()) => {
                        info!(kb_id, chunk_count, "Knowledge base ready");
                        Ok(kb)
                    }
                    Err(e) => {
                        self.record_failed(kb, &e).await;
                        Err(e)
                    }
                }
            }
            Err(e) => {
                self.record_failed(kb, &e).await;
                Err(e)
            }
        };

        self.in_flight.lock().await.remove(kb_id);
        result
    }

    /// Best effort; the original error is what the caller sees.
    async fn record_failed(&self, mut kb: KnowledgeBase, cause: &IngestionError) {
        let kb_id = kb.id.clone();
        kb.status = KbStatus::Failed;
        kb.failure = Some(cause.to_string());
        kb.updated_at = Utc::now();
        if let Err(update_err) = self.store.update(kb).await {
            warn!(kb_id = %kb_id, error = %update_err, "Failed to record FAILED status");
        }
        warn!(kb_id = %kb_id, error = %cause, "Knowledge base build failed");
    }

    async fn run_build(
        &self,
        kb: &KnowledgeBase,
        embedder: Arc<dyn EmbeddingClient>,
        spec: &EmbeddingSpec,
    ) -> Result<usize, IngestionError> {
        let bytes = self.store.get_source(&kb.id).await?;
        let text = self.extractor.extract_text(&kb.file_name, &bytes).await?;

        let pieces = chunk_text(&text, self.chunk_size, self.chunk_overlap);
        if pieces.is_empty() {
            return Err(IngestionError::ExtractionFailed(
                "document produced no text".into(),
            ));
        }

        let vectors = embedder
            .embed(&pieces, &spec.model)
            .await
            .map_err(|e| IngestionError::EmbeddingFailed(e.to_string()))?;
        if vectors.len() != pieces.len() {
            return Err(IngestionError::EmbeddingFailed(format!(
                "expected {} vectors, got {}",
                pieces.len(),
                vectors.len()
            )));
        }

        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(ordinal, (text, embedding))| Chunk {
                knowledge_base_id: kb.id.clone(),
                ordinal,
                text,
                embedding,
            })
            .collect();

        let count = chunks.len();
        self.store.replace_chunks(&kb.id, chunks).await?;
        Ok(count)
    }
}

//! Similarity search over embedded chunks.
//!
//! Only `READY` knowledge bases participate. The query is embedded with the
//! same provider/model each knowledge base was built with; bases sharing an
//! embedding space share one query embedding per search.

use crate::store::KnowledgeStore;
use agentforge_core::error::IngestionError;
use agentforge_core::knowledge::{EmbeddingSpec, KbStatus, KnowledgeBase, ScoredChunk};
use agentforge_core::provider::EmbeddingClient;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Cosine similarity between two vectors, accumulated in f64 for stability.
/// Zero-magnitude or mismatched-length vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Scores chunks from a set of knowledge bases against a query.
pub struct SearchIndex {
    store: Arc<dyn KnowledgeStore>,
}

impl SearchIndex {
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self { store }
    }

    /// Search the given knowledge bases. Bases that are not `READY` are
    /// skipped, as are bases whose embedding space has no resolvable client.
    /// Results are sorted by descending score; ties break by ascending
    /// (knowledge base id, ordinal). An empty result is not an error.
    pub async fn search(
        &self,
        bases: &[KnowledgeBase],
        query: &str,
        top_k: usize,
        resolve: impl Fn(&EmbeddingSpec) -> Option<Arc<dyn EmbeddingClient>>,
    ) -> Result<Vec<ScoredChunk>, IngestionError> {
        if top_k == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        // One query embedding per distinct embedding space.
        let mut query_vectors: HashMap<EmbeddingSpec, Vec<f32>> = HashMap::new();
        let mut hits: Vec<ScoredChunk> = Vec::new();

        for kb in bases {
            if kb.status != KbStatus::Ready {
                continue;
            }
            let Some(spec) = kb.embedding.clone() else {
                continue;
            };

            if !query_vectors.contains_key(&spec) {
                let Some(embedder) = resolve(&spec) else {
                    debug!(kb_id = %kb.id, "No embedding client for knowledge base, skipping");
                    continue;
                };
                let mut vectors = embedder
                    .embed(&[query.to_string()], &spec.model)
                    .await
                    .map_err(|e| IngestionError::EmbeddingFailed(e.to_string()))?;
                let vector = vectors
                    .pop()
                    .ok_or_else(|| IngestionError::EmbeddingFailed("empty embedding".into()))?;
                query_vectors.insert(spec.clone(), vector);
            }
            let query_vec = &query_vectors[&spec];

            for chunk in self.store.chunks(&kb.id).await? {
                hits.push(ScoredChunk {
                    score: cosine_similarity(query_vec, &chunk.embedding),
                    knowledge_base_id: chunk.knowledge_base_id,
                    ordinal: chunk.ordinal,
                    chunk_text: chunk.text,
                });
            }
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.knowledge_base_id.cmp(&b.knowledge_base_id))
                .then_with(|| a.ordinal.cmp(&b.ordinal))
        });
        hits.truncate(top_k);
        Ok(hits)
    }
}

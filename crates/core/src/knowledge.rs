//! Knowledge base and chunk domain types.
//!
//! A knowledge base is one uploaded document's ingested representation:
//! lifecycle status, the embedding model it was built with, and a set of
//! ordered chunks. Status transitions are driven by the ingestion pipeline:
//! `UPLOADED → PROCESSING → READY | FAILED`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Knowledge base lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KbStatus {
    Uploaded,
    Processing,
    Ready,
    Failed,
}

/// The embedding provider/model pair a knowledge base was built with.
/// Mixing embedding spaces invalidates similarity scores, so search embeds
/// queries with the same spec recorded here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbeddingSpec {
    pub provider: String,
    pub model: String,
}

/// One uploaded document, tracked through ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBase {
    pub id: String,
    pub agent_id: String,
    pub file_name: String,
    pub status: KbStatus,
    pub chunk_count: usize,

    /// Set when embeddings were built; pins the embedding space.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<EmbeddingSpec>,

    /// Cause recorded on transition to FAILED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeBase {
    /// Create a freshly uploaded knowledge base in `UPLOADED` status.
    pub fn uploaded(agent_id: impl Into<String>, file_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            file_name: file_name.into(),
            status: KbStatus::Uploaded,
            chunk_count: 0,
            embedding: None,
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One embedded unit of a knowledge base's source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub knowledge_base_id: String,
    /// Stable position within the source document.
    pub ordinal: usize,
    pub text: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// A scored retrieval hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredChunk {
    pub knowledge_base_id: String,
    pub ordinal: usize,
    pub chunk_text: String,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_format() {
        assert_eq!(serde_json::to_string(&KbStatus::Ready).unwrap(), "\"READY\"");
        let s: KbStatus = serde_json::from_str("\"PROCESSING\"").unwrap();
        assert_eq!(s, KbStatus::Processing);
    }

    #[test]
    fn uploaded_starts_empty() {
        let kb = KnowledgeBase::uploaded("agent-1", "handbook.pdf");
        assert_eq!(kb.status, KbStatus::Uploaded);
        assert_eq!(kb.chunk_count, 0);
        assert!(kb.embedding.is_none());
        assert!(kb.failure.is_none());
    }

    #[test]
    fn chunk_embedding_not_serialized() {
        let chunk = Chunk {
            knowledge_base_id: "kb-1".into(),
            ordinal: 0,
            text: "hello".into(),
            embedding: vec![0.1, 0.2],
        };
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(!json.contains("0.1"));
        assert!(json.contains("hello"));
    }
}

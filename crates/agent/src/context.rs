//! Knowledge-context retrieval seam.
//!
//! The orchestrator asks for context by agent and query; how chunks are
//! stored, embedded and scored is the knowledge pipeline's business.

use agentforge_core::error::IngestionError;
use agentforge_core::knowledge::ScoredChunk;
use async_trait::async_trait;

/// Supplies the top-scoring chunks for a user query.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn retrieve(
        &self,
        agent_id: &str,
        query: &str,
    ) -> std::result::Result<Vec<ScoredChunk>, IngestionError>;
}

/// Render retrieved chunks as the context block appended to the system
/// prompt. Empty input renders nothing.
pub fn context_block(chunks: &[ScoredChunk]) -> Option<String> {
    if chunks.is_empty() {
        return None;
    }
    let mut block = String::from("## Knowledge Context\n");
    block.push_str(
        "Use the following excerpts from the agent's knowledge bases when relevant:\n",
    );
    for chunk in chunks {
        block.push_str("\n---\n");
        block.push_str(&chunk.chunk_text);
        block.push('\n');
    }
    Some(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_retrieval_renders_nothing() {
        assert!(context_block(&[]).is_none());
    }

    #[test]
    fn block_contains_chunk_texts() {
        let chunks = vec![
            ScoredChunk {
                knowledge_base_id: "kb-1".into(),
                ordinal: 0,
                chunk_text: "Refunds within 30 days.".into(),
                score: 0.9,
            },
            ScoredChunk {
                knowledge_base_id: "kb-1".into(),
                ordinal: 3,
                chunk_text: "Shipping takes 5 days.".into(),
                score: 0.7,
            },
        ];
        let block = context_block(&chunks).unwrap();
        assert!(block.starts_with("## Knowledge Context"));
        assert!(block.contains("Refunds within 30 days."));
        assert!(block.contains("Shipping takes 5 days."));
    }
}

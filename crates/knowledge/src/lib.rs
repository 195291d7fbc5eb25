//! Knowledge ingestion and retrieval for AgentForge.
//!
//! Two-phase ingestion: `upload` registers the raw document and returns
//! immediately in `UPLOADED`; `build_embeddings` runs extraction, chunking
//! and embedding, driving the status machine
//! `UPLOADED → PROCESSING → READY | FAILED`. Retrieval scores chunks by
//! cosine similarity in the same embedding space the knowledge base was
//! built with.

pub mod chunker;
pub mod index;
pub mod pipeline;
pub mod store;

pub use chunker::chunk_text;
pub use index::{cosine_similarity, SearchIndex};
pub use pipeline::IngestionPipeline;
pub use store::{InMemoryKnowledgeStore, KnowledgeStore};

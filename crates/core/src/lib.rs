//! # AgentForge Core
//!
//! Domain types, traits, and error definitions for the AgentForge agent
//! platform. This crate has **zero framework dependencies**: it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external capability (LLM completion, embeddings, HTTP transport,
//! text extraction) is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod action;
pub mod agent;
pub mod error;
pub mod extract;
pub mod knowledge;
pub mod message;
pub mod provider;
pub mod transport;

// Re-export key types at crate root for ergonomics
pub use action::{
    Action, AuthConfig, AuthPlacement, ExecutionMode, HttpMethod, Integration, VarType, Variable,
};
pub use agent::{Agent, LlmProvider};
pub use error::{
    ChatError, Error, IngestionError, InvocationError, ProviderError, Result, TemplateError,
    TransportError, ValidationError,
};
pub use extract::TextExtractor;
pub use knowledge::{Chunk, EmbeddingSpec, KbStatus, KnowledgeBase, ScoredChunk};
pub use message::{ChatMessage, Role, ToolCallRecord, ToolResultRecord, Transcript};
pub use provider::{
    CompletionProvider, CompletionRequest, CompletionResponse, EmbeddingClient, ToolDefinition,
    Usage,
};
pub use transport::{HttpRequestSpec, HttpResponse, HttpTransport};

//! The AgentForge application service.
//!
//! Wires the engine together: entity repositories, the secrets vault, the
//! action invoker, the knowledge pipeline, and the chat orchestrator, exposed
//! as one facade ([`AgentForge`]) whose operations mirror what the builder
//! console needs. Transports and providers are injected behind traits so the
//! whole stack runs against mocks in tests.

pub mod extractor;
pub mod providers;
pub mod repo;
pub mod retriever;
pub mod service;
pub mod telemetry;

pub use extractor::PlainTextExtractor;
pub use providers::ProviderFactory;
pub use service::{
    ActionDraft, AgentDraft, AgentForge, AgentUpdate, IntegrationDraft, TestRunReport,
};
pub use telemetry::init_tracing;

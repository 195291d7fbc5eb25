//! The AgentForge chat orchestrator.
//!
//! Runs one user turn against an agent: builds the system prompt (persona
//! plus retrieved knowledge context), exposes attached actions as tools,
//! and loops model call → tool execution → model call until the model stops
//! requesting tools or the round bound trips.

pub mod context;
pub mod orchestrator;

pub use context::ContextRetriever;
pub use orchestrator::ChatOrchestrator;

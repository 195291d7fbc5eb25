//! Error types for the AgentForge domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context has
//! its own error type; the top-level `Error` aggregates them.
//!
//! Failure semantics (who treats what as fatal) live with the callers:
//! a `ValidationError` is always surfaced synchronously and never retried;
//! an `InvocationError` is non-fatal inside a chat turn but fatal for a
//! direct test call; an `IngestionError` is terminal per knowledge base;
//! a `ProviderError` from the completion call aborts the turn.

use thiserror::Error;

/// The top-level error type for all AgentForge operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Invocation error: {0}")]
    Invocation(#[from] InvocationError),

    #[error("Ingestion error: {0}")]
    Ingestion(#[from] IngestionError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A definition or input failed validation. Carries *all* violations so a
/// test console can show every problem at once, not just the first.
#[derive(Debug, Clone, Error)]
#[error("{}", violations.join("; "))]
pub struct ValidationError {
    pub violations: Vec<String>,
}

impl ValidationError {
    pub fn new(violations: Vec<String>) -> Self {
        Self { violations }
    }

    pub fn single(violation: impl Into<String>) -> Self {
        Self {
            violations: vec![violation.into()],
        }
    }
}

/// Template compilation failures (pure, deterministic).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("unknown variable '{name}' referenced in template")]
    UnknownVariable { name: String },

    #[error("no value bound for required variable '{name}'")]
    MissingBinding { name: String },

    #[error("type mismatch for variable '{name}': expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },
}

/// An action execution failed at the transport level.
///
/// Secrets must never appear in `cause`; the invoker redacts auth values
/// marked `secret` before constructing this error.
#[derive(Debug, Clone, Error)]
#[error("action invocation failed{}: {cause}", http_status.map(|s| format!(" (status {s})")).unwrap_or_default())]
pub struct InvocationError {
    /// HTTP status, when the endpoint answered with a non-2xx code.
    pub http_status: Option<u16>,
    pub cause: String,
}

impl InvocationError {
    pub fn transport(cause: impl Into<String>) -> Self {
        Self {
            http_status: None,
            cause: cause.into(),
        }
    }

    pub fn status(status: u16, cause: impl Into<String>) -> Self {
        Self {
            http_status: Some(status),
            cause: cause.into(),
        }
    }
}

/// Knowledge ingestion failures, terminal per knowledge base.
#[derive(Debug, Clone, Error)]
pub enum IngestionError {
    #[error("text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("knowledge base not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Chat turn failures.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The per-message tool-round bound was exceeded. Fatal to the current
    /// turn only; the transcript remains usable for the next message.
    #[error("tool loop exceeded after {rounds} tool-execution rounds")]
    ToolLoopExceeded { rounds: u32 },

    /// Transport failure of the LLM completion call itself, fatal to the turn.
    #[error("LLM transport error: {0}")]
    Transport(#[from] ProviderError),
}

/// LLM / embedding provider failures.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Raw HTTP transport failures (no response received at all).
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),
}

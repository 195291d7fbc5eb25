//! LLM provider implementations for AgentForge.
//!
//! Each backend implements the core `CompletionProvider` and
//! `EmbeddingClient` traits over its native wire protocol. The
//! [`ProviderRouter`] constructs the right backend for an agent's
//! configured provider, holding the decrypted API key only inside the
//! provider instance.

pub mod google;
pub mod openai;
pub mod router;

pub use google::GoogleProvider;
pub use openai::OpenAiProvider;
pub use router::ProviderRouter;

use agentforge_core::error::ProviderError;

/// Map a reqwest failure (no HTTP response received) onto `ProviderError`.
pub(crate) fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else {
        ProviderError::Network(err.to_string())
    }
}

/// Map a non-success HTTP response onto `ProviderError`.
pub(crate) fn map_status_error(
    status: reqwest::StatusCode,
    retry_after_secs: Option<u64>,
    body: String,
) -> ProviderError {
    match status.as_u16() {
        429 => ProviderError::RateLimited {
            retry_after_secs: retry_after_secs.unwrap_or(60),
        },
        401 | 403 => ProviderError::AuthenticationFailed(body),
        code => ProviderError::ApiError {
            status_code: code,
            message: body,
        },
    }
}

//! Configuration loading and validation for AgentForge.
//!
//! Loads from a TOML file with environment variable overrides, validates at
//! startup, and redacts secrets from `Debug` output.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Passphrase used to derive the at-rest encryption key for agent
    /// API keys. Overridable via `AGENTFORGE_SECRETS_PASSPHRASE`.
    #[serde(default)]
    pub secrets_passphrase: Option<String>,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

/// Chat-loop knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum tool-execution rounds per user message.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Tool outputs longer than this are truncated before being fed back to
    /// the model; the stored transcript keeps the full payload.
    #[serde(default = "default_max_tool_result_chars")]
    pub max_tool_result_chars: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tool_rounds() -> u32 {
    5
}
fn default_max_tool_result_chars() -> usize {
    8000
}
fn default_temperature() -> f32 {
    0.7
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            max_tool_result_chars: default_max_tool_result_chars(),
            temperature: default_temperature(),
        }
    }
}

/// Ingestion and retrieval knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Maximum chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks injected into the system prompt per chat turn.
    #[serde(default = "default_top_k")]
    pub context_top_k: usize,
}

fn default_chunk_size() -> usize {
    1200
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_top_k() -> usize {
    3
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            context_top_k: default_top_k(),
        }
    }
}

/// Timeouts for the blocking external calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_action_timeout")]
    pub action_timeout_secs: u64,

    #[serde(default = "default_llm_timeout")]
    pub llm_timeout_secs: u64,

    #[serde(default = "default_embedding_timeout")]
    pub embedding_timeout_secs: u64,
}

fn default_action_timeout() -> u64 {
    30
}
fn default_llm_timeout() -> u64 {
    120
}
fn default_embedding_timeout() -> u64 {
    60
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            action_timeout_secs: default_action_timeout(),
            llm_timeout_secs: default_llm_timeout(),
            embedding_timeout_secs: default_embedding_timeout(),
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "secrets_passphrase",
                &self.secrets_passphrase.as_ref().map(|_| "[REDACTED]"),
            )
            .field("chat", &self.chat)
            .field("knowledge", &self.knowledge)
            .field("http", &self.http)
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Load from a TOML file, apply env overrides, and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let mut config: AppConfig = toml::from_str(&text)?;
        config.apply_env_overrides();
        config.validate()?;
        debug!(path = %path.as_ref().display(), "Loaded configuration");
        Ok(config)
    }

    /// Defaults plus env overrides, for when no config file exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(passphrase) = std::env::var("AGENTFORGE_SECRETS_PASSPHRASE") {
            self.secrets_passphrase = Some(passphrase);
        }
        if let Ok(rounds) = std::env::var("AGENTFORGE_MAX_TOOL_ROUNDS") {
            if let Ok(n) = rounds.parse() {
                self.chat.max_tool_rounds = n;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chat.max_tool_rounds == 0 {
            return Err(ConfigError::Invalid("chat.max_tool_rounds must be >= 1".into()));
        }
        if self.knowledge.chunk_size == 0 {
            return Err(ConfigError::Invalid("knowledge.chunk_size must be >= 1".into()));
        }
        if self.knowledge.chunk_overlap >= self.knowledge.chunk_size {
            return Err(ConfigError::Invalid(
                "knowledge.chunk_overlap must be smaller than chunk_size".into(),
            ));
        }
        if self.knowledge.context_top_k == 0 {
            return Err(ConfigError::Invalid("knowledge.context_top_k must be >= 1".into()));
        }
        Ok(())
    }
}

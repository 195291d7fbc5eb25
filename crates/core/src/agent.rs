//! Agent entity: an LLM persona with a system prompt, provider/model
//! selection, and a write-only provider API key.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported LLM providers. A capability selected by configuration, not a
/// type hierarchy. The provider crate keys a dispatch table on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Google,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Self::OpenAi),
            "google" => Ok(Self::Google),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

/// An operator-defined agent.
///
/// The API key is stored encrypted and is write-only: it is never serialized
/// back out, and `Debug` redacts the ciphertext too.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub system_prompt: String,
    pub llm_provider: LlmProvider,
    pub llm_model: String,

    /// Encrypted provider API key (opaque; produced by `agentforge-security`).
    #[serde(skip_serializing)]
    #[serde(default)]
    pub api_key_enc: String,

    /// Ordered list of attached action IDs.
    #[serde(default)]
    pub action_ids: Vec<String>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        llm_provider: LlmProvider,
        llm_model: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            system_prompt: system_prompt.into(),
            llm_provider,
            llm_model: llm_model.into(),
            api_key_enc: String::new(),
            action_ids: Vec::new(),
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("llm_provider", &self.llm_provider)
            .field("llm_model", &self.llm_model)
            .field("api_key_enc", &"[REDACTED]")
            .field("action_ids", &self.action_ids)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LlmProvider::OpenAi).unwrap(), "\"openai\"");
        let p: LlmProvider = serde_json::from_str("\"google\"").unwrap();
        assert_eq!(p, LlmProvider::Google);
    }

    #[test]
    fn api_key_never_serialized() {
        let mut agent = Agent::new("support-bot", "You help users.", LlmProvider::OpenAi, "gpt-4");
        agent.api_key_enc = "ciphertext".into();
        let json = serde_json::to_string(&agent).unwrap();
        assert!(!json.contains("ciphertext"));
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn debug_redacts_key() {
        let mut agent = Agent::new("a", "p", LlmProvider::Google, "gemini-pro");
        agent.api_key_enc = "secret-bytes".into();
        let dbg = format!("{agent:?}");
        assert!(!dbg.contains("secret-bytes"));
        assert!(dbg.contains("REDACTED"));
    }
}

//! Chat message and transcript domain types.
//!
//! A transcript is an append-only sequence of messages held for the duration
//! of one test session. Tool calls and tool results are recorded as ordered
//! side-channels on the messages that produced them, so a turn can be
//! replayed without mutating earlier entries.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions (persona, rules)
    System,
    /// Synthetic tool-result turn fed back to the model
    Tool,
}

/// A model-emitted request to invoke a named action with specific inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Call ID assigned by the provider (matched by the tool result)
    pub id: String,

    /// Name of the action to invoke
    pub tool: String,

    /// Resolved inputs as a JSON object
    pub inputs: serde_json::Value,
}

/// The outcome of one tool call: exactly one of `output` / `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultRecord {
    /// The call ID this result answers
    pub call_id: String,

    /// Name of the action that ran
    pub tool: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResultRecord {
    pub fn ok(call_id: impl Into<String>, tool: impl Into<String>, output: serde_json::Value) -> Self {
        Self {
            call_id: call_id.into(),
            tool: tool.into(),
            output: Some(output),
            error: None,
        }
    }

    pub fn err(call_id: impl Into<String>, tool: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            tool: tool.into(),
            output: None,
            error: Some(error.into()),
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

/// A single message in a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested during the turn that produced this message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,

    /// Tool results accumulated during that turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolResultRecord>,

    /// For `Role::Tool` messages, which call this content answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            tool_call_id: None,
        }
    }

    /// A synthetic tool-role turn answering one tool call.
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// An append-only ordered sequence of messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    pub messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// The most recent user message, if any.
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = ChatMessage::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn last_user_content_skips_assistant() {
        let mut t = Transcript::new();
        t.push(ChatMessage::user("first"));
        t.push(ChatMessage::assistant("reply"));
        t.push(ChatMessage::user("second"));
        t.push(ChatMessage::assistant("reply 2"));
        assert_eq!(t.last_user_content(), Some("second"));
    }

    #[test]
    fn tool_result_record_outcomes() {
        let ok = ToolResultRecord::ok("c1", "checkBalance", serde_json::json!({"balance": 120}));
        assert!(!ok.is_err());
        let err = ToolResultRecord::err("c2", "checkBalance", "timeout");
        assert!(err.is_err());
        assert!(err.output.is_none());
    }

    #[test]
    fn message_serialization_roundtrip() {
        let mut msg = ChatMessage::assistant("done");
        msg.tool_calls.push(ToolCallRecord {
            id: "call_1".into(),
            tool: "checkBalance".into(),
            inputs: serde_json::json!({"userId": "7"}),
        });
        let json = serde_json::to_string(&msg).unwrap();
        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tool_calls.len(), 1);
        assert_eq!(back.tool_calls[0].tool, "checkBalance");
    }
}

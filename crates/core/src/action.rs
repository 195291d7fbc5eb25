//! Action and Integration domain types.
//!
//! An Integration describes an HTTP endpoint (method, URL, auth). An Action
//! binds an Integration to an LLM-callable tool: a description for the model,
//! a closed set of typed variables, and up to three templates that shape the
//! request. The template language itself lives in `agentforge-template`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// HTTP methods supported by integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        write!(f, "{s}")
    }
}

/// Where an auth entry is applied on the outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthPlacement {
    Header,
    Query,
}

/// One auth entry attached to an integration.
///
/// `value` may contain an `{{API_KEY}}` placeholder, resolved at invocation
/// time from the owning agent's decrypted key. Entries with `secret: true`
/// are never logged or echoed in error messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(rename = "type")]
    pub placement: AuthPlacement,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub secret: bool,
}

/// An HTTP endpoint definition that actions bind to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub method: HttpMethod,

    /// URL template; may contain `{param}` path placeholders.
    pub url: String,

    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub default_params: BTreeMap<String, String>,

    #[serde(default)]
    pub auth_enabled: bool,
    /// Ordered auth entries, applied after defaults.
    #[serde(default)]
    pub auth_config: Vec<AuthConfig>,
}

impl Integration {
    pub fn new(name: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            method,
            url: url.into(),
            default_headers: BTreeMap::new(),
            default_params: BTreeMap::new(),
            auth_enabled: false,
            auth_config: Vec::new(),
        }
    }
}

/// Whether an action runs only when the model chooses (`ON_CALL`) or
/// unconditionally after each model turn (`POST_CALL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    OnCall,
    PostCall,
}

/// The closed set of variable types. Validation matches on the tag; there
/// is no duck-typed coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl std::fmt::Display for VarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        };
        write!(f, "{s}")
    }
}

impl VarType {
    /// Whether a JSON value matches this declared type.
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }

    /// The JSON-schema type name for this variable type.
    pub fn schema_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

/// A declared action variable. All variables are required at invocation time
/// (the model has no defaults to fall back on).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: VarType,
    #[serde(default)]
    pub description: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, kind: VarType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
        }
    }
}

/// A named, parameterized HTTP call exposed to an agent as a callable tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    pub name: String,

    /// The tool description exposed to the model.
    pub description_for_llm: String,

    pub integration_id: String,
    pub execution_mode: ExecutionMode,

    /// Ordered variable declarations; names are unique within an action.
    #[serde(default)]
    pub variables: Vec<Variable>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_template: Option<String>,
    /// Overrides the integration URL when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_template: Option<String>,
}

impl Action {
    pub fn new(
        name: impl Into<String>,
        description_for_llm: impl Into<String>,
        integration_id: impl Into<String>,
        execution_mode: ExecutionMode,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description_for_llm: description_for_llm.into(),
            integration_id: integration_id.into(),
            execution_mode,
            variables: Vec::new(),
            body_template: None,
            url_template: None,
            query_template: None,
        }
    }

    /// Look up a declared variable by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// JSON Schema describing this action's inputs, for the tool definition
    /// sent to the LLM.
    pub fn parameters_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for v in &self.variables {
            properties.insert(
                v.name.clone(),
                serde_json::json!({
                    "type": v.kind.schema_type(),
                    "description": v.description,
                }),
            );
            required.push(serde_json::Value::String(v.name.clone()));
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Convert this action into a tool definition for the LLM.
    pub fn to_tool_definition(&self) -> crate::provider::ToolDefinition {
        crate::provider::ToolDefinition {
            name: self.name.clone(),
            description: self.description_for_llm.clone(),
            parameters: self.parameters_schema(),
        }
    }
}

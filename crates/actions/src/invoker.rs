//! Rendering and dispatching action invocations.
//!
//! Validation is collect-all: every missing, mistyped, or undeclared input
//! is reported in one pass. Rendering is delegated to `agentforge-template`.
//! Auth entries resolve their `{{API_KEY}}` placeholder from the agent's
//! decrypted key at the last moment, and any value marked secret is scrubbed
//! from error causes before they leave this module.

use crate::API_KEY_PLACEHOLDER;
use agentforge_core::action::{Action, AuthPlacement, Integration};
use agentforge_core::error::{Error, InvocationError, Result, ValidationError};
use agentforge_core::transport::{HttpRequestSpec, HttpTransport};
use agentforge_template::{render, render_url};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// The successful result of one invocation, as handed back to the model or
/// the test console.
#[derive(Debug, Clone)]
pub struct InvocationOutcome {
    pub status: u16,
    pub data: Value,
}

impl InvocationOutcome {
    /// The JSON shape tool results use.
    pub fn into_value(self) -> Value {
        serde_json::json!({ "status": self.status, "data": self.data })
    }
}

/// Renders and dispatches actions over a pluggable transport.
pub struct ActionInvoker {
    transport: Arc<dyn HttpTransport>,
}

impl ActionInvoker {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Validate inputs, render the request, and dispatch it.
    ///
    /// `api_key` is the owning agent's decrypted key, consumed only by auth
    /// entries carrying the `{{API_KEY}}` placeholder.
    #[instrument(skip_all, fields(action = %action.name))]
    pub async fn invoke(
        &self,
        action: &Action,
        integration: &Integration,
        inputs: &BTreeMap<String, Value>,
        api_key: Option<&str>,
    ) -> Result<InvocationOutcome> {
        validate_inputs(action, inputs)?;

        let url_template = action.url_template.as_deref().unwrap_or(&integration.url);
        let url = render_url(url_template, inputs, &action.variables)?;

        let body = match &action.body_template {
            Some(template) => Some(render(template, inputs, &action.variables)?.into_json()),
            None => None,
        };

        let mut query = integration.default_params.clone();
        if let Some(template) = &action.query_template {
            let rendered = render(template, inputs, &action.variables)?.into_json();
            let Value::Object(entries) = rendered else {
                return Err(Error::Validation(ValidationError::single(
                    "query template must render to a JSON object",
                )));
            };
            for (key, value) in entries {
                query.insert(key, query_value(&value));
            }
        }

        let mut headers = integration.default_headers.clone();
        let mut secrets: Vec<String> = api_key.map(str::to_string).into_iter().collect();
        if integration.auth_enabled {
            for auth in &integration.auth_config {
                let resolved = match api_key {
                    Some(key) => auth.value.replace(API_KEY_PLACEHOLDER, key),
                    None => auth.value.clone(),
                };
                if auth.secret {
                    secrets.push(resolved.clone());
                }
                match auth.placement {
                    AuthPlacement::Header => headers.insert(auth.key.clone(), resolved),
                    AuthPlacement::Query => query.insert(auth.key.clone(), resolved),
                };
            }
        }

        let request = HttpRequestSpec {
            method: integration.method,
            url,
            headers,
            query,
            body,
        };
        debug!(method = %request.method, "Dispatching action request");

        let response = self
            .transport
            .dispatch(request)
            .await
            .map_err(|e| InvocationError::transport(redact(&e.to_string(), &secrets)))?;

        if !response.is_success() {
            let cause = redact(&body_excerpt(&response.body), &secrets);
            return Err(InvocationError::status(response.status, cause).into());
        }

        Ok(InvocationOutcome {
            status: response.status,
            data: response.body,
        })
    }
}

/// Check presence, type, and declaredness of every input, collecting all
/// violations instead of stopping at the first.
fn validate_inputs(action: &Action, inputs: &BTreeMap<String, Value>) -> Result<()> {
    let mut violations = Vec::new();

    for var in &action.variables {
        match inputs.get(&var.name) {
            None => violations.push(format!("missing required variable '{}'", var.name)),
            Some(value) if !var.kind.matches(value) => violations.push(format!(
                "variable '{}' expects {}, got {}",
                var.name,
                var.kind,
                json_type_name(value)
            )),
            Some(_) => {}
        }
    }
    for name in inputs.keys() {
        if action.variable(name).is_none() {
            violations.push(format!("undeclared input '{name}'"));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(violations).into())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Stringify a query parameter: strings raw, everything else JSON.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

const BODY_EXCERPT_LIMIT: usize = 1000;

fn body_excerpt(body: &Value) -> String {
    let text = match body {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > BODY_EXCERPT_LIMIT {
        let cut: String = text.chars().take(BODY_EXCERPT_LIMIT).collect();
        format!("{cut}…")
    } else {
        text
    }
}

/// Replace every known secret in `text` with a marker.
fn redact(text: &str, secrets: &[String]) -> String {
    let mut out = text.to_string();
    for secret in secrets {
        if !secret.is_empty() {
            out = out.replace(secret, "[REDACTED]");
        }
    }
    out
}

//! Template rendering with typed bindings.

use agentforge_core::action::{VarType, Variable};
use agentforge_core::error::TemplateError;
use serde_json::Value;
use std::collections::BTreeMap;


/// The result of rendering: plain text, or a structural value when the whole
/// template is exactly one `{{name}}` reference (this lets a body template be
/// "just" a JSON object variable).
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Text(String),
    Value(Value),
}

impl Rendered {
    /// Convert to a JSON value either way: structural results pass through,
    /// text results become JSON strings (or parsed JSON when they parse).
    pub fn into_json(self) -> Value {
        match self {
            Rendered::Value(v) => v,
            Rendered::Text(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Rendered::Text(s) => s,
            Rendered::Value(v) => v.to_string(),
        }
    }
}

/// Look up and type-check a binding for one token.
fn resolve<'a>(
    name: &str,
    bindings: &'a BTreeMap<String, Value>,
    declared: &[Variable],
) -> Result<(&'a Value, VarType), TemplateError> {
    let var = declared
        .iter()
        .find(|v| v.name == name)
        .ok_or_else(|| TemplateError::UnknownVariable { name: name.to_string() })?;

    let value = bindings
        .get(name)
        .ok_or_else(|| TemplateError::MissingBinding { name: name.to_string() })?;

    if !var.kind.matches(value) {
        return Err(TemplateError::TypeMismatch {
            name: name.to_string(),
            expected: var.kind.to_string(),
            actual: json_type_name(value).to_string(),
        });
    }

    Ok((value, var.kind))
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

/// How a bound value is embedded inside a string template: strings are
/// inserted raw (the template supplies its own quoting), everything else is
/// JSON-serialized.
fn embed(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a template string against typed bindings.
///
/// Deterministic and side-effect free: identical arguments always yield
/// identical output.
pub fn render(
    template: &str,
    bindings: &BTreeMap<String, Value>,
    declared: &[Variable],
) -> Result<Rendered, TemplateError> {
    // Exact-match structural pass-through: the whole template is one token.
    if let Some(name) = whole_token(template) {
        let (value, _) = resolve(name, bindings, declared)?;
        return Ok(Rendered::Value(value.clone()));
    }

    Ok(Rendered::Text(render_values(template, bindings, declared)?))
}

/// One left-to-right pass over the template. Substituted values are copied
/// to the output verbatim and never rescanned, so a bound value that itself
/// contains `{{...}}` stays literal in the result.
fn render_values(
    template: &str,
    bindings: &BTreeMap<String, Value>,
    declared: &[Variable],
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let Some(end) = rest[start + 2..].find("}}") else {
            // Unterminated run is literal text.
            break;
        };
        let name = rest[start + 2..start + 2 + end].trim();
        let token_end = start + 2 + end + 2;
        if name.is_empty() || name.contains('{') || name.contains('}') {
            out.push_str(&rest[..token_end]);
        } else {
            let (value, _) = resolve(name, bindings, declared)?;
            out.push_str(&rest[..start]);
            out.push_str(&embed(value));
        }
        rest = &rest[token_end..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Render a URL template: `{{name}}` value tokens and `{name}` path
/// placeholders, in one scan of the original template.
pub fn render_url(
    template: &str,
    bindings: &BTreeMap<String, Value>,
    declared: &[Variable],
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{{") {
            match after.find("}}") {
                Some(end) => {
                    let name = after[..end].trim();
                    if name.is_empty() || name.contains('{') || name.contains('}') {
                        out.push_str(&tail[..end + 4]);
                    } else {
                        let (value, _) = resolve(name, bindings, declared)?;
                        out.push_str(&embed(value));
                    }
                    rest = &tail[end + 4..];
                }
                None => {
                    out.push_str("{{");
                    rest = after;
                }
            }
            continue;
        }
        match tail[1..].find('}') {
            Some(end) => {
                let name = tail[1..1 + end].trim();
                if name.is_empty() || name.contains('{') {
                    out.push_str(&tail[..end + 2]);
                } else {
                    let (value, _) = resolve(name, bindings, declared)?;
                    out.push_str(&embed(value));
                }
                rest = &tail[end + 2..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// If the template is exactly `{{name}}` with nothing else, return the name.
fn whole_token(template: &str) -> Option<&str> {
    let inner = template.strip_prefix("{{")?.strip_suffix("}}")?;
    let name = inner.trim();
    if name.is_empty() || name.contains('{') || name.contains('}') {
        return None;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentforge_core::action::VarType;
    use serde_json::json;

    fn vars(defs: &[(&str, VarType)]) -> Vec<Variable> {
        defs.iter()
            .map(|(n, t)| Variable::new(*n, *t, ""))
            .collect()
    }

    fn bind(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn renders_string_variable_raw() {
        let out = render(
            r#"{"userId":"{{userId}}"}"#,
            &bind(&[("userId", json!("42"))]),
            &vars(&[("userId", VarType::String)]),
        )
        .unwrap();
        assert_eq!(out, Rendered::Text(r#"{"userId":"42"}"#.into()));
    }

    #[test]
    fn rendering_is_deterministic() {
        let b = bind(&[("userId", json!("42"))]);
        let v = vars(&[("userId", VarType::String)]);
        let a = render(r#"{"userId":"{{userId}}"}"#, &b, &v).unwrap();
        let c = render(r#"{"userId":"{{userId}}"}"#, &b, &v).unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn unknown_variable_fails() {
        let err = render("{{nobody}}", &bind(&[]), &vars(&[])).unwrap_err();
        assert_eq!(err, TemplateError::UnknownVariable { name: "nobody".into() });
    }

    #[test]
    fn missing_binding_fails() {
        let err = render(
            "{{userId}} x",
            &bind(&[]),
            &vars(&[("userId", VarType::String)]),
        )
        .unwrap_err();
        assert_eq!(err, TemplateError::MissingBinding { name: "userId".into() });
    }

    #[test]
    fn number_rejects_non_numeric() {
        let err = render(
            "count={{n}}",
            &bind(&[("n", json!("not a number"))]),
            &vars(&[("n", VarType::Number)]),
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::TypeMismatch { .. }));
    }

    #[test]
    fn boolean_accepts_only_literals() {
        let v = vars(&[("flag", VarType::Boolean)]);
        let ok = render("f={{flag}}", &bind(&[("flag", json!(true))]), &v).unwrap();
        assert_eq!(ok, Rendered::Text("f=true".into()));

        let err = render("f={{flag}}", &bind(&[("flag", json!(1))]), &v).unwrap_err();
        assert!(matches!(err, TemplateError::TypeMismatch { .. }));
    }

    #[test]
    fn object_embedded_as_json_inside_string_template() {
        let out = render(
            r#"{"payload":{{data}}}"#,
            &bind(&[("data", json!({"a": 1}))]),
            &vars(&[("data", VarType::Object)]),
        )
        .unwrap();
        assert_eq!(out, Rendered::Text(r#"{"payload":{"a":1}}"#.into()));
    }

    #[test]
    fn whole_template_token_passes_structurally() {
        let out = render(
            "{{data}}",
            &bind(&[("data", json!({"a": [1, 2]}))]),
            &vars(&[("data", VarType::Object)]),
        )
        .unwrap();
        assert_eq!(out, Rendered::Value(json!({"a": [1, 2]})));
    }

    #[test]
    fn url_supports_both_brace_forms() {
        let out = render_url(
            "https://api.x/bal/{userId}?v={{version}}",
            &bind(&[("userId", json!("7")), ("version", json!("2"))]),
            &vars(&[("userId", VarType::String), ("version", VarType::String)]),
        )
        .unwrap();
        assert_eq!(out, "https://api.x/bal/7?v=2");
    }

    #[test]
    fn literal_double_brace_not_treated_as_path() {
        // {{userId}} must resolve as a value token, never as path token "{userId}".
        let err = render_url("https://api.x/{{userId}}", &bind(&[]), &vars(&[])).unwrap_err();
        assert_eq!(err, TemplateError::UnknownVariable { name: "userId".into() });
    }

    #[test]
    fn scenario_check_balance_url() {
        let out = render_url(
            "https://api.x/bal/{userId}",
            &bind(&[("userId", json!("7"))]),
            &vars(&[("userId", VarType::String)]),
        )
        .unwrap();
        assert_eq!(out, "https://api.x/bal/7");
    }

    #[test]
    fn bound_value_containing_token_stays_literal() {
        let out = render(
            "{{a}} {{b}}",
            &bind(&[("a", json!("{{b}}")), ("b", json!("x"))]),
            &vars(&[("a", VarType::String), ("b", VarType::String)]),
        )
        .unwrap();
        assert_eq!(out, Rendered::Text("{{b}} x".into()));
    }

    #[test]
    fn url_substituted_value_not_rescanned() {
        let out = render_url(
            "https://api.x/{a}/{b}",
            &bind(&[("a", json!("{b}")), ("b", json!("2"))]),
            &vars(&[("a", VarType::String), ("b", VarType::String)]),
        )
        .unwrap();
        assert_eq!(out, "https://api.x/{b}/2");
    }

    #[test]
    fn rendered_into_json_parses_object_text() {
        let r = Rendered::Text(r#"{"userId":"42"}"#.into());
        assert_eq!(r.into_json(), json!({"userId": "42"}));
    }
}

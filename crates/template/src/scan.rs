//! Token scanning and action-level template validation.

use agentforge_core::action::Action;
use agentforge_core::error::ValidationError;

/// Collect the names of all `{{name}}` value tokens in a template, in order
/// of appearance. Unterminated brace runs are treated as literal text.
pub fn value_tokens(template: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let bytes = template.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'{' && bytes[i + 1] == b'{' {
            if let Some(end) = template[i + 2..].find("}}") {
                let name = template[i + 2..i + 2 + end].trim();
                if !name.is_empty() && !name.contains('{') && !name.contains('}') {
                    tokens.push(name.to_string());
                }
                i += 2 + end + 2;
                continue;
            }
        }
        i += 1;
    }
    tokens
}

/// Collect the names of single-brace `{name}` path tokens, skipping
/// double-brace value tokens so the two syntaxes never collide.
pub fn path_tokens(template: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            // Double-brace run belongs to the value syntax; skip it whole.
            if i + 1 < bytes.len() && bytes[i + 1] == b'{' {
                if let Some(end) = template[i + 2..].find("}}") {
                    i += 2 + end + 2;
                    continue;
                }
                i += 2;
                continue;
            }
            if let Some(end) = template[i + 1..].find('}') {
                let name = template[i + 1..i + 1 + end].trim();
                if !name.is_empty() && !name.contains('{') {
                    tokens.push(name.to_string());
                }
                i += 1 + end + 1;
                continue;
            }
        }
        i += 1;
    }
    tokens
}

/// Validate an action's declared variables against its templates.
///
/// Collects *all* violations: duplicate variable names, and any template
/// token (value tokens everywhere, path tokens in the URL template) that
/// does not correspond to a declared variable. Construction and update must
/// reject actions that fail this check.
pub fn validate_action_templates(action: &Action) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    let mut seen = std::collections::HashSet::new();
    for v in &action.variables {
        if !seen.insert(v.name.as_str()) {
            violations.push(format!("duplicate variable name '{}'", v.name));
        }
    }

    let declared: std::collections::HashSet<&str> =
        action.variables.iter().map(|v| v.name.as_str()).collect();

    let mut check = |template: &str, which: &str, include_path: bool| {
        let mut names = value_tokens(template);
        if include_path {
            names.extend(path_tokens(template));
        }
        for name in names {
            if !declared.contains(name.as_str()) {
                violations.push(format!(
                    "template '{which}' references undeclared variable '{name}'"
                ));
            }
        }
    };

    if let Some(t) = &action.body_template {
        check(t, "bodyTemplate", false);
    }
    if let Some(t) = &action.query_template {
        check(t, "queryTemplate", false);
    }
    if let Some(t) = &action.url_template {
        check(t, "urlTemplate", true);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(violations))
    }
}

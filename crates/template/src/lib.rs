//! Pure template compiler for action definitions.
//!
//! Two placeholder syntaxes coexist:
//! - `{{name}}`: value substitution, usable in body, query, and URL
//!   templates. Scanned first, so a literal `{{x}}` is never mistaken for a
//!   path placeholder.
//! - `{name}`: path-style substitution, recognized **only** in URL
//!   templates, matching integration URL syntax.
//!
//! There is no escape sequence for literal braces: a `{{token}}` whose name
//! is not a declared variable is an error, and a single-brace `{token}` in a
//! non-URL template passes through verbatim.
//!
//! Rendering is a pure function: deterministic, no side effects, safe to
//! call with partial bindings for preview flows (missing bindings fail fast
//! with a typed error rather than rendering garbage).

pub mod render;
pub mod scan;

pub use render::{render, render_url, Rendered};
pub use scan::{path_tokens, validate_action_templates, value_tokens};

//! Webhook body templates.
//!
//! Supported placeholders: `{{title}}`, `{{content}}`, `{{timestamp}}`. Each
//! substitution is JSON-string-escaped, so placeholders belong inside string
//! literals of the template. The rendered text must parse as JSON.

use substrack_core::error::{Result, SubsTrackError};

pub const DEFAULT_TEMPLATE: &str =
    r#"{"title":"{{title}}","content":"{{content}}","timestamp":"{{timestamp}}"}"#;

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub timestamp: &'a str,
}

/// Render `template` and check the result is valid JSON.
pub fn render(template: &str, vars: TemplateVars<'_>) -> Result<String> {
    let rendered = template
        .replace("{{title}}", &escape_json_string(vars.title))
        .replace("{{content}}", &escape_json_string(vars.content))
        .replace("{{timestamp}}", &escape_json_string(vars.timestamp));

    serde_json::from_str::<serde_json::Value>(&rendered)
        .map_err(|e| SubsTrackError::Template(format!("rendered body is not valid JSON: {e}")))?;
    Ok(rendered)
}

/// Escape `raw` for placement between the quotes of a JSON string literal.
fn escape_json_string(raw: &str) -> String {
    let quoted = serde_json::Value::String(raw.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

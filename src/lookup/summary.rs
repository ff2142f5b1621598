//! Summary tag derivation for IntSights payloads.

use serde::Serialize;
use serde_json::Value;

/// Maximum number of tags kept before the overflow marker.
pub const MAX_SUMMARY_TAGS: usize = 6;

/// Payload shape violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("Unexpected response payload: expected a JSON object")]
    NotAnObject,

    #[error("Unexpected response payload: missing Sources list")]
    MissingSources,
}

/// Short human-readable tags describing an IOC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IocSummary(Vec<String>);

impl IocSummary {
    pub fn tags(&self) -> &[String] {
        &self.0
    }

    pub fn into_tags(self) -> Vec<String> {
        self.0
    }
}

/// Derive summary tags from a non-empty payload.
///
/// Order: source count, severity, `Tags`, `SystemTags`. Anything past
/// [`MAX_SUMMARY_TAGS`] is collapsed into a `+N more tags` marker.
pub fn summarize(payload: &Value) -> Result<IocSummary, PayloadError> {
    let object = payload.as_object().ok_or(PayloadError::NotAnObject)?;

    let sources = object
        .get("Sources")
        .and_then(Value::as_array)
        .ok_or(PayloadError::MissingSources)?;

    let mut tags = vec![format!("Sources: {}", sources.len())];

    if let Some(severity) = object.get("Severity").filter(|v| is_truthy(v)) {
        tags.push(format!("Severity: {}", render(severity)));
    }

    for field in ["Tags", "SystemTags"] {
        if let Some(entries) = object.get(field).and_then(Value::as_array) {
            tags.extend(entries.iter().map(render));
        }
    }

    if tags.len() > MAX_SUMMARY_TAGS {
        let remaining = tags.len() - MAX_SUMMARY_TAGS;
        tags.truncate(MAX_SUMMARY_TAGS);
        tags.push(format!("+{} more tags", remaining));
    }

    Ok(IocSummary(tags))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Strings render bare, everything else as JSON text.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//! Shared utility functions

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Parse a datetime string (RFC3339 format) or return current time
///
/// Timestamps are stored as RFC3339 text; a corrupt value falls back to the
/// current time instead of failing the whole row.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Textual form of a JSON scalar as it would appear in a query string
///
/// Strings are returned without quotes, numbers and booleans in their JSON
/// spelling. Arrays, objects and null have no textual form.
///
/// ```
/// use serde_json::json;
/// use tutorhub_db::utils::scalar_text;
///
/// assert_eq!(scalar_text(&json!("math")).as_deref(), Some("math"));
/// assert_eq!(scalar_text(&json!(12)).as_deref(), Some("12"));
/// assert_eq!(scalar_text(&json!(null)), None);
/// ```
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

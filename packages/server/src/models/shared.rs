use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

use crate::error::AppError;

/// Body shape shared by every endpoint, success or failure.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    /// `{}` on success, `{ "code": ... }` on failure.
    pub error: Value,
}

/// Build a successful envelope response.
pub fn respond<T: Serialize>(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Response {
    let body = Envelope {
        success: true,
        message: message.into(),
        data,
        error: json!({}),
    };
    (status, Json(body)).into_response()
}

/// Parse a layout coordinate from its textual form.
///
/// Accepts any finite decimal number. Anything else, including sentinels such
/// as `"null"` or the empty string, is rejected.
pub fn parse_position(field: &str, text: &str) -> Result<f64, AppError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| AppError::Validation(format!("{field} must be a finite number.")))
}

/// Parse a layout coordinate from a JSON value (number or numeric string).
pub fn position_from_value(field: &str, value: &Value) -> Result<f64, AppError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| AppError::Validation(format!("{field} must be a finite number."))),
        Value::String(s) => parse_position(field, s),
        _ => Err(AppError::Validation(format!(
            "{field} must be a finite number."
        ))),
    }
}

/// Serde helper for optional coordinates in JSON bodies.
///
/// * field absent or `null` => `None`
/// * number or numeric string => `Some(v)`
/// * anything else => deserialization error
pub fn optional_position<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => position_from_value("position", &value)
            .map(Some)
            .map_err(|_| serde::de::Error::custom("position must be a finite number")),
    }
}

/// Decode an encoded description (a JSON array of strings).
///
/// Returns `Ok(None)` when the text is blank or JSON `null`, meaning "leave
/// unchanged". Lines are trimmed and blank lines dropped.
pub fn parse_description(text: &str) -> Result<Option<Vec<String>>, AppError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let decoded: Option<Vec<String>> = serde_json::from_str(text)
        .map_err(|_| AppError::Validation("Invalid description format.".into()))?;
    Ok(decoded.map(normalize_description))
}

/// Trim every line and drop the ones left empty.
pub fn normalize_description(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

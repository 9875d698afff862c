//! Status-code policy applied to every core service response.

use http::StatusCode;
use serde_json::{Value, json};

use super::model::{CoreResponse, NormalizedResponse};

/// Rewrite a core response into a JSON-only [`NormalizedResponse`].
///
/// - `422`: body replaced by `{"error": "Unexpected Error"}`.
/// - `200`: a non-empty JSON body passes through, anything else becomes
///   `{"status": "OK"}`.
/// - any other status: JSON bodies pass through, non-JSON becomes `{}`.
///
/// Applying it to its own output yields the same value.
#[must_use]
pub fn normalize(core: &CoreResponse) -> NormalizedResponse {
    let body = match core.status {
        StatusCode::UNPROCESSABLE_ENTITY => json!({ "error": "Unexpected Error" }),
        StatusCode::OK => parse_json(&core.body)
            .filter(|value| !is_empty_value(value))
            .unwrap_or_else(|| json!({ "status": "OK" })),
        _ => parse_json(&core.body).unwrap_or_else(|| json!({})),
    };
    NormalizedResponse::new(core.status, body)
}

fn parse_json(raw: &[u8]) -> Option<Value> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(raw).ok()
}

/// `null`, `""`, `[]` and `{}` carry no payload.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

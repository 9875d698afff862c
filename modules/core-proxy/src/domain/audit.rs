//! Audit records of proxied exchanges and the recorder that persists them.
//!
//! "core" fields describe the call made to the core service and its raw
//! answer; "proxy" fields describe the call received by the gateway and the
//! normalized answer returned to the caller.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use http::HeaderMap;
use serde_json::{Map, Value};

use super::model::{CoreResponse, ForwardedRequest, InboundRequest, NormalizedResponse};
use super::ports::AuditSink;

const REDACTED: &str = "***";
const TRUNCATED_MARKER: &str = "...[truncated]";
const SECRET_BODY_KEYS: [&str; 4] = ["password", "access_token", "refresh_token", "token"];

/// One proxied exchange, created once per request cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub core_method: String,
    pub core_url: String,
    pub core_request_headers: String,
    pub core_request_body: String,
    pub proxy_method: String,
    pub proxy_url: String,
    pub proxy_request_headers: String,
    pub proxy_request_body: String,
    pub core_status: u16,
    pub core_response_headers: String,
    pub core_response_body: String,
    pub proxy_status: u16,
    pub proxy_response_headers: String,
    pub proxy_response_body: String,
    pub created_at: DateTime<Utc>,
}

/// A persisted [`AuditRecord`] with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: i64,
    pub record: AuditRecord,
}

impl AuditRecord {
    /// Snapshot one exchange. Header blobs are JSON objects with secrets
    /// redacted. JSON bodies have secret keys masked at any depth, then every
    /// body is cut at `max_body_bytes`.
    #[must_use]
    pub fn capture(
        inbound: &InboundRequest,
        forwarded: &ForwardedRequest,
        core: &CoreResponse,
        normalized: &NormalizedResponse,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            core_method: forwarded.method.to_string(),
            core_url: forwarded.url.to_string(),
            core_request_headers: headers_blob(&forwarded.headers),
            core_request_body: body_text(&forwarded.body, max_body_bytes),
            proxy_method: inbound.method.to_string(),
            proxy_url: inbound.uri.to_string(),
            proxy_request_headers: headers_blob(&inbound.headers),
            proxy_request_body: body_text(&inbound.body, max_body_bytes),
            core_status: core.status.as_u16(),
            core_response_headers: headers_blob(&core.headers),
            core_response_body: body_text(&core.body, max_body_bytes),
            proxy_status: normalized.status().as_u16(),
            proxy_response_headers: headers_blob(&normalized.response_headers()),
            proxy_response_body: body_text(&normalized.body_bytes(), max_body_bytes),
            created_at: Utc::now(),
        }
    }
}

/// Serialize headers as one JSON object; repeated names are joined by `, `.
fn headers_blob(headers: &HeaderMap) -> String {
    let mut out = Map::new();
    for name in headers.keys() {
        let value = if [AUTHORIZATION, COOKIE, SET_COOKIE].contains(name) {
            REDACTED.to_owned()
        } else {
            headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ")
        };
        out.insert(name.as_str().to_owned(), Value::String(value));
    }
    Value::Object(out).to_string()
}

/// Mask credential-bearing keys of a JSON body. Anything else is kept as is.
fn redact_body(body: &[u8]) -> Cow<'_, [u8]> {
    let Ok(mut value) = serde_json::from_slice::<Value>(body) else {
        return Cow::Borrowed(body);
    };
    if !redact_value(&mut value) {
        return Cow::Borrowed(body);
    }
    Cow::Owned(value.to_string().into_bytes())
}

fn redact_value(value: &mut Value) -> bool {
    match value {
        Value::Object(map) => {
            let mut changed = false;
            for (key, inner) in map {
                if SECRET_BODY_KEYS.contains(&key.as_str()) {
                    *inner = Value::String(REDACTED.to_owned());
                    changed = true;
                } else {
                    changed |= redact_value(inner);
                }
            }
            changed
        }
        Value::Array(items) => items.iter_mut().fold(false, |acc, v| redact_value(v) | acc),
        _ => false,
    }
}

fn body_text(body: &[u8], max_bytes: usize) -> String {
    let redacted = redact_body(body);
    let body: &[u8] = &redacted;
    if body.len() <= max_bytes {
        return String::from_utf8_lossy(body).into_owned();
    }
    let mut text = String::from_utf8_lossy(body.get(..max_bytes).unwrap_or(body)).into_owned();
    text.push_str(TRUNCATED_MARKER);
    text
}

/// Persists audit records without ever failing the surrounding request.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    max_latency: Duration,
    max_body_bytes: usize,
}

impl AuditRecorder {
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>, max_latency: Duration, max_body_bytes: usize) -> Self {
        Self {
            sink,
            max_latency,
            max_body_bytes,
        }
    }

    /// Capture and store one exchange. Storage errors and timeouts are
    /// logged and swallowed.
    pub async fn record(
        &self,
        inbound: &InboundRequest,
        forwarded: &ForwardedRequest,
        core: &CoreResponse,
        normalized: &NormalizedResponse,
    ) {
        let record = AuditRecord::capture(inbound, forwarded, core, normalized, self.max_body_bytes);
        let core_url = record.core_url.clone();

        match tokio::time::timeout(self.max_latency, self.sink.store(record)).await {
            Ok(Ok(())) => tracing::debug!(core_url = %core_url, "Audit record stored"),
            Ok(Err(e)) => {
                tracing::error!(error = %e, core_url = %core_url, "Failed to store audit record");
            }
            Err(_) => tracing::error!(
                core_url = %core_url,
                timeout_ms = u64::try_from(self.max_latency.as_millis()).unwrap_or(u64::MAX),
                "Audit record store timed out"
            ),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::header::{CONTENT_TYPE, HeaderValue};
    use http::{Method, StatusCode, Uri};
    use serde_json::json;
    use url::Url;

    use crate::domain::normalize::normalize;

    fn exchange() -> (InboundRequest, ForwardedRequest, CoreResponse) {
        let mut inbound_headers = HeaderMap::new();
        inbound_headers.insert(COOKIE, HeaderValue::from_static("sessionid=s1"));
        inbound_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let inbound = InboundRequest::new(
            Method::POST,
            Uri::from_static("/api/v1/dialogues/?page=2"),
            inbound_headers,
            Bytes::from_static(br#"{"title":"t"}"#),
        );

        let mut fwd_headers = HeaderMap::new();
        fwd_headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        fwd_headers.append("accept", HeaderValue::from_static("text/html"));
        fwd_headers.append("accept", HeaderValue::from_static("application/json"));
        let forwarded = ForwardedRequest {
            method: Method::POST,
            url: Url::parse("http://core/api/v1/dialogues?page=2").unwrap(),
            headers: fwd_headers,
            body: inbound.body.clone(),
        };

        let mut core_headers = HeaderMap::new();
        core_headers.insert(SET_COOKIE, HeaderValue::from_static("csrftoken=x"));
        let core = CoreResponse::new(StatusCode::UNPROCESSABLE_ENTITY, core_headers, "bad");
        (inbound, forwarded, core)
    }

    #[test]
    fn capture_fills_both_sides() {
        let (inbound, forwarded, core) = exchange();
        let normalized = normalize(&core);
        let record = AuditRecord::capture(&inbound, &forwarded, &core, &normalized, 1024);

        assert_eq!(record.core_method, "POST");
        assert_eq!(record.core_url, "http://core/api/v1/dialogues?page=2");
        assert_eq!(record.proxy_url, "/api/v1/dialogues/?page=2");
        assert_eq!(record.core_status, 422);
        assert_eq!(record.core_response_body, "bad");
        assert_eq!(record.proxy_status, 422);
        assert_eq!(record.proxy_response_body, r#"{"error":"Unexpected Error"}"#);
    }

    #[test]
    fn secrets_are_redacted_in_header_blobs() {
        let (inbound, forwarded, core) = exchange();
        let record = AuditRecord::capture(&inbound, &forwarded, &core, &normalize(&core), 1024);

        let core_req: Value = serde_json::from_str(&record.core_request_headers).unwrap();
        assert_eq!(core_req["authorization"], REDACTED);
        assert_eq!(core_req["accept"], "text/html, application/json");

        let proxy_req: Value = serde_json::from_str(&record.proxy_request_headers).unwrap();
        assert_eq!(proxy_req["cookie"], REDACTED);
        assert_eq!(proxy_req["content-type"], "application/json");

        let core_resp: Value = serde_json::from_str(&record.core_response_headers).unwrap();
        assert_eq!(core_resp, json!({ "set-cookie": REDACTED }));
    }

    #[test]
    fn long_bodies_are_truncated() {
        assert_eq!(body_text(b"abcdef", 3), "abc...[truncated]");
        assert_eq!(body_text(b"abc", 3), "abc");
        assert_eq!(body_text(b"", 3), "");
    }

    #[test]
    fn credentials_are_masked_in_json_bodies() {
        let login = br#"{"email":"a@b.com","password":"hunter2"}"#;
        let text = body_text(login, 1024);
        assert!(!text.contains("hunter2"));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({ "email": "a@b.com", "password": REDACTED }));

        let answer = br#"{"result":{"access_token":"TOKEN-abc","refresh_token":"r","items":[{"token":"t"}]}}"#;
        let parsed: Value = serde_json::from_str(&body_text(answer, 1024)).unwrap();
        assert_eq!(
            parsed,
            json!({ "result": {
                "access_token": REDACTED,
                "refresh_token": REDACTED,
                "items": [{ "token": REDACTED }]
            } })
        );
    }

    #[test]
    fn masking_happens_before_truncation() {
        let login = br#"{"password":"hunter2","note":"aaaaaaaaaaaaaaaaaaaaaaaa"}"#;
        let text = body_text(login, 20);
        assert!(!text.contains("hunter2"));
        assert!(text.ends_with(TRUNCATED_MARKER));
    }

    #[test]
    fn bodies_without_secrets_are_kept_verbatim() {
        assert_eq!(body_text(br#"{ "title" : "t" }"#, 1024), r#"{ "title" : "t" }"#);
        assert_eq!(body_text(b"password=hunter2", 1024), "password=hunter2");
    }
}

//! Value types flowing through the gateway pipeline.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{HeaderMap, Method, StatusCode, Uri};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

/// A call received by the gateway. Read-only to the pipeline.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Path and query as received, including the API prefix.
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    /// Body parsed as JSON, `None` when empty or not JSON.
    #[must_use]
    pub fn json_body(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }
}

/// Bearer token issued by the core service and cached against a principal.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for building the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// A locally known user of the gateway.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    /// At most one active credential at a time.
    pub credential: Option<Credential>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Opaque session handle given to the caller after login.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The caller's identity as resolved from its session, if any.
#[derive(Debug, Clone)]
pub struct Caller {
    pub session_id: SessionId,
    pub principal: Principal,
}

/// Outbound request to the core service. Lives for one forward call.
#[derive(Debug, Clone)]
pub struct ForwardedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Raw answer of the core service.
#[derive(Debug, Clone)]
pub struct CoreResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CoreResponse {
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}

/// Core response after the status policy; the body is always JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResponse {
    status: StatusCode,
    body: Value,
}

impl NormalizedResponse {
    pub(crate) fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    #[must_use]
    pub fn into_parts(self) -> (StatusCode, Value) {
        (self.status, self.body)
    }

    /// Whether the status forbids a response body (`204`, `304`).
    #[must_use]
    pub fn is_bodiless(&self) -> bool {
        matches!(self.status, StatusCode::NO_CONTENT | StatusCode::NOT_MODIFIED)
    }

    /// Headers the gateway attaches when returning this response.
    #[must_use]
    pub fn response_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if !self.is_bodiless() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers
    }

    /// Serialized body as sent to the caller.
    #[must_use]
    pub fn body_bytes(&self) -> Bytes {
        if self.is_bodiless() {
            return Bytes::new();
        }
        Bytes::from(self.body.to_string())
    }
}

impl From<&NormalizedResponse> for CoreResponse {
    fn from(resp: &NormalizedResponse) -> Self {
        Self::new(resp.status, resp.response_headers(), resp.body_bytes())
    }
}

/// Session side effect produced by a gateway operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    Unchanged,
    Established(SessionId),
    Terminated,
}

/// Final result of a gateway operation, ready to be rendered.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub response: NormalizedResponse,
    pub session: SessionChange,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("super-secret");
        assert_eq!(format!("{credential:?}"), "Credential(***)");
        assert_eq!(credential.expose(), "super-secret");
    }

    #[test]
    fn json_body_ignores_empty_and_invalid_bodies() {
        let mut req = InboundRequest::new(
            Method::POST,
            Uri::from_static("/api/v1/users/login"),
            HeaderMap::new(),
            Bytes::new(),
        );
        assert!(req.json_body().is_none());

        req.body = Bytes::from_static(b"email=a@b.com");
        assert!(req.json_body().is_none());

        req.body = Bytes::from_static(br#"{"email":"a@b.com"}"#);
        assert_eq!(req.json_body().unwrap()["email"], "a@b.com");
    }

    #[test]
    fn generated_session_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }
}

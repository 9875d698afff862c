//! RFC 9457 problem documents emitted by the core proxy.
//!
//! Every error the gateway reports carries one [`ErrorCode`]. The code fixes
//! the HTTP status, the title and the `type` URI, so callers only supply the
//! detail and the request path the problem occurred at.

use http::StatusCode;
use serde::{Serialize, Serializer};

/// Content type for problem documents.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

const TYPE_BASE: &str = "https://errors.core-proxy.local/";

/// Error catalog of the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Configuration,
    UpstreamUnavailable,
    UpstreamTimeout,
    BadRequest,
    MalformedBot,
    Unauthenticated,
    NotFound,
    MethodNotAllowed,
    PayloadTooLarge,
    RequestTimeout,
    Internal,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "CORE_PROXY_CONFIGURATION",
            Self::UpstreamUnavailable => "CORE_PROXY_UPSTREAM_UNAVAILABLE",
            Self::UpstreamTimeout => "CORE_PROXY_UPSTREAM_TIMEOUT",
            Self::BadRequest => "CORE_PROXY_BAD_REQUEST",
            Self::MalformedBot => "CORE_PROXY_MALFORMED_BOT",
            Self::Unauthenticated => "CORE_PROXY_UNAUTHENTICATED",
            Self::NotFound => "CORE_PROXY_NOT_FOUND",
            Self::MethodNotAllowed => "CORE_PROXY_METHOD_NOT_ALLOWED",
            Self::PayloadTooLarge => "CORE_PROXY_PAYLOAD_TOO_LARGE",
            Self::RequestTimeout => "CORE_PROXY_REQUEST_TIMEOUT",
            Self::Internal => "CORE_PROXY_INTERNAL",
        }
    }

    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Configuration | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamUnavailable | Self::MalformedBot => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout | Self::RequestTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Configuration => "Configuration error",
            Self::UpstreamUnavailable => "Core service unavailable",
            Self::UpstreamTimeout => "Core service timeout",
            Self::BadRequest => "Invalid request",
            Self::MalformedBot => "Malformed bot descriptor",
            Self::Unauthenticated => "Authentication required",
            Self::NotFound => "Not found",
            Self::MethodNotAllowed => "Method not allowed",
            Self::PayloadTooLarge => "Payload too large",
            Self::RequestTimeout => "Request timeout",
            Self::Internal => "Internal Server Error",
        }
    }

    /// Code for an error status produced by the HTTP stack itself rather
    /// than by a handler.
    #[must_use]
    pub const fn for_transport_status(status: StatusCode) -> Option<Self> {
        match status.as_u16() {
            400 => Some(Self::BadRequest),
            404 => Some(Self::NotFound),
            405 => Some(Self::MethodNotAllowed),
            413 => Some(Self::PayloadTooLarge),
            504 => Some(Self::RequestTimeout),
            _ => None,
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Problem document returned by every failing gateway endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    #[serde(rename = "type")]
    type_url: String,
    title: &'static str,
    status: u16,
    detail: String,
    /// Path of the inbound request.
    #[serde(skip_serializing_if = "String::is_empty")]
    instance: String,
    code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ValidationViolation>,
}

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationViolation {
    pub field: String,
    pub message: String,
}

impl Problem {
    #[must_use]
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            type_url: format!("{TYPE_BASE}{}", code.as_str()),
            title: code.title(),
            status: code.status().as_u16(),
            detail: detail.into(),
            instance: String::new(),
            code,
            trace_id: None,
            errors: Vec::new(),
        }
    }

    /// Record the request path the problem occurred at.
    #[must_use]
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.instance = path.into();
        self
    }

    #[must_use]
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_violation(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.push(ValidationViolation {
            field: field.into(),
            message: message.into(),
        });
        self
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.code.status()
    }

    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    #[must_use]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationViolation] {
        &self.errors
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for Problem {
    fn into_response(self) -> axum::response::Response {
        use axum::http::HeaderValue;

        let status = self.status();
        let mut resp = axum::Json(self).into_response();
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp
    }
}

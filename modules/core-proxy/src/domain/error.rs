//! Domain errors for the core proxy.

use thiserror::Error;

/// Domain-level errors raised while handling a gateway operation.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Unknown operation or an endpoint that cannot be resolved.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The core service could not be reached.
    #[error("core service unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    /// The core service did not answer within the configured timeout.
    #[error("core service timed out")]
    UpstreamTimeout,

    /// Inbound data could not be turned into an outbound call.
    #[error("invalid request: {field}: {message}")]
    RequestBuild { field: String, message: String },

    /// A bot descriptor `name` could not be parsed.
    #[error("malformed bot name field: {name:?}")]
    MalformedNameField { name: String },

    /// Operation requires an authenticated caller.
    #[error("authentication required")]
    Unauthenticated,

    /// Principal or session persistence failed on the request path.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl DomainError {
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn upstream_unavailable(reason: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn request_build(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RequestBuild {
            field: field.into(),
            message: message.into(),
        }
    }
}

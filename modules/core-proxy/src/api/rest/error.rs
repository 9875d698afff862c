//! REST error mapping for the core proxy.

use axum::response::{IntoResponse, Response};
use http::Uri;
use http::header::CONTENT_TYPE;
use proxy_errors::{ErrorCode, Problem};

use crate::domain::error::DomainError;

/// Result type of REST handlers.
pub type ApiResult<T> = Result<T, Problem>;

/// Convert `DomainError` to Problem for REST responses.
impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        let trace_id = tracing::Span::current()
            .id()
            .map(|id| id.into_u64().to_string());

        let mut problem = match &e {
            DomainError::Configuration { message } => {
                tracing::error!(%message, "Gateway misconfiguration");
                Problem::new(
                    ErrorCode::Configuration,
                    "The gateway is not configured for this operation",
                )
            }
            DomainError::UpstreamUnavailable { reason } => {
                Problem::new(ErrorCode::UpstreamUnavailable, reason.as_str())
            }
            DomainError::UpstreamTimeout => Problem::new(
                ErrorCode::UpstreamTimeout,
                "The core service did not answer in time",
            ),
            DomainError::RequestBuild { field, message } => {
                Problem::new(ErrorCode::BadRequest, format!("{field}: {message}"))
                    .with_violation(field.as_str(), message.as_str())
            }
            DomainError::MalformedNameField { name } => Problem::new(
                ErrorCode::MalformedBot,
                format!("Cannot parse bot name {name}"),
            ),
            DomainError::Unauthenticated => {
                Problem::new(ErrorCode::Unauthenticated, "Log in to use this operation")
            }
            DomainError::Storage(_) => {
                tracing::error!(error = %e, "Storage error occurred");
                Problem::new(ErrorCode::Internal, "An internal error occurred")
            }
        };

        if let Some(id) = trace_id {
            problem = problem.with_trace_id(id);
        }
        problem
    }
}

/// Problem for `e`, located at the inbound request path.
#[must_use]
pub fn problem_at(e: DomainError, uri: &Uri) -> Problem {
    Problem::from(e).at(uri.path())
}

/// Rewrite error responses produced by the HTTP stack (body limit, timeout,
/// routing and extractor rejections) into problem documents.
///
/// JSON answers pass through untouched.
#[allow(clippy::unused_async)]
pub async fn problem_for_bare_errors(uri: Uri, response: Response) -> Response {
    let Some(code) = ErrorCode::for_transport_status(response.status()) else {
        return response;
    };
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json"));
    if is_json {
        return response;
    }
    tracing::debug!(status = %response.status(), path = %uri.path(), "Rewriting bare error response");
    transport_problem(code, &uri).into_response()
}

/// Problem for an error raised by routing or the server layers.
#[must_use]
pub fn transport_problem(code: ErrorCode, uri: &Uri) -> Problem {
    Problem::new(code, transport_detail(code)).at(uri.path())
}

const fn transport_detail(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::NotFound => "No gateway route matches this path",
        ErrorCode::MethodNotAllowed => "This route does not accept the request method",
        ErrorCode::PayloadTooLarge => "The request body exceeds the configured limit",
        ErrorCode::RequestTimeout => "The request did not complete in time",
        _ => "The request could not be processed",
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::Value;

    #[test]
    fn statuses_follow_error_taxonomy() {
        let cases = [
            (DomainError::configuration("x"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::upstream_unavailable("down"), StatusCode::BAD_GATEWAY),
            (DomainError::UpstreamTimeout, StatusCode::GATEWAY_TIMEOUT),
            (DomainError::request_build("email", "missing"), StatusCode::BAD_REQUEST),
            (DomainError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                DomainError::Storage(anyhow::anyhow!("db down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(Problem::from(err).status(), status);
        }
    }

    #[test]
    fn storage_details_are_not_leaked() {
        let problem = Problem::from(DomainError::Storage(anyhow::anyhow!("password=hunter2")));
        assert_eq!(problem.code(), ErrorCode::Internal);
        assert!(!problem.detail().contains("hunter2"));
    }

    #[test]
    fn request_build_detail_names_the_field() {
        let problem = Problem::from(DomainError::request_build("id", "not a number"));
        assert_eq!(problem.detail(), "id: not a number");
        assert_eq!(problem.errors()[0].field, "id");
    }

    #[test]
    fn located_problems_carry_the_path_without_query() {
        let uri = Uri::from_static("/api/v1/dialogues?page=2");
        let problem = problem_at(DomainError::Unauthenticated, &uri);
        assert_eq!(problem.instance(), "/api/v1/dialogues");
    }

    #[tokio::test]
    async fn bare_transport_errors_become_problems() {
        let bare = (StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded").into_response();
        let response =
            problem_for_bare_errors(Uri::from_static("/api/v1/users/login"), bare).await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            proxy_errors::APPLICATION_PROBLEM_JSON
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "CORE_PROXY_PAYLOAD_TOO_LARGE");
        assert_eq!(body["instance"], "/api/v1/users/login");

        let timed_out = StatusCode::GATEWAY_TIMEOUT.into_response();
        let response = problem_for_bare_errors(Uri::from_static("/api/v1/bots"), timed_out).await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            proxy_errors::APPLICATION_PROBLEM_JSON
        );
    }

    #[tokio::test]
    async fn json_answers_pass_through() {
        let passthrough = (
            StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({ "error": "Unexpected Error" })),
        )
            .into_response();
        let response = problem_for_bare_errors(Uri::from_static("/api/v1/dialogues/9"), passthrough).await;
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");

        let ok = StatusCode::NO_CONTENT.into_response();
        let response = problem_for_bare_errors(Uri::from_static("/api/v1/users/logout"), ok).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }
}

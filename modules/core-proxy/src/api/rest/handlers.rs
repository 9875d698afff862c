//! REST handlers for the core proxy.
//!
//! Handlers are thin: collect the inbound call, run the gateway operation,
//! render the normalized answer and the session cookie.

use std::sync::Arc;

use axum::Json;
use axum::body::to_bytes;
use axum::extract::{Extension, Path, Query, Request};
use axum::response::{IntoResponse, Response};
use http::Uri;
use http::header::SET_COOKIE;
use proxy_errors::{ErrorCode, Problem};

use super::dto::{AuditEntryDto, AuditLogQuery, HealthResponse};
use super::error::{ApiResult, problem_at, transport_problem};
use super::session::{CurrentCaller, SessionCookie};
use crate::domain::endpoint::{Operation, PathParams};
use crate::domain::error::DomainError;
use crate::domain::model::{GatewayResponse, InboundRequest, SessionChange};
use crate::domain::service::Gateway;

// === Health Endpoints ===

/// GET {prefix}/health - Liveness probe (no auth required).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

// === Gateway Endpoints ===

/// Operations addressed without a path parameter.
#[tracing::instrument(skip_all, fields(operation = %operation))]
pub async fn forward(
    Extension(svc): Extension<Arc<Gateway>>,
    Extension(cookie): Extension<Arc<SessionCookie>>,
    Extension(operation): Extension<Operation>,
    CurrentCaller(caller): CurrentCaller,
    request: Request,
) -> ApiResult<Response> {
    let uri = request.uri().clone();
    let inbound = collect_inbound(request)
        .await
        .map_err(|e| problem_at(e, &uri))?;
    let result = svc
        .handle(operation, PathParams::default(), caller.as_ref(), inbound)
        .await
        .map_err(|e| problem_at(e, &uri))?;
    Ok(render(result, &cookie))
}

/// Operations addressed by a dialogue id.
#[tracing::instrument(skip_all, fields(operation = %operation, dialogue_id = %id))]
pub async fn forward_dialogue(
    Extension(svc): Extension<Arc<Gateway>>,
    Extension(cookie): Extension<Arc<SessionCookie>>,
    Extension(operation): Extension<Operation>,
    Path(id): Path<String>,
    CurrentCaller(caller): CurrentCaller,
    request: Request,
) -> ApiResult<Response> {
    let uri = request.uri().clone();
    let dialogue_id = id.parse::<u64>().map_err(|_| {
        problem_at(
            DomainError::request_build("id", "dialogue id must be a non-negative integer"),
            &uri,
        )
    })?;
    let inbound = collect_inbound(request)
        .await
        .map_err(|e| problem_at(e, &uri))?;
    let result = svc
        .handle(operation, PathParams::dialogue(dialogue_id), caller.as_ref(), inbound)
        .await
        .map_err(|e| problem_at(e, &uri))?;
    Ok(render(result, &cookie))
}

// === Admin Endpoints ===

/// GET {prefix}/admin/logs - Audit records, oldest first.
#[tracing::instrument(skip(svc, uri))]
pub async fn list_audit_logs(
    Extension(svc): Extension<Arc<Gateway>>,
    uri: Uri,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<Vec<AuditEntryDto>>> {
    let entries = svc
        .audit_entries(query.limit())
        .await
        .map_err(|e| problem_at(e, &uri))?;
    Ok(Json(entries.into_iter().map(AuditEntryDto::from).collect()))
}

// === Fallbacks ===

/// Paths outside the route table.
pub async fn not_found(uri: Uri) -> Problem {
    transport_problem(ErrorCode::NotFound, &uri)
}

/// Known paths called with a method they do not accept.
pub async fn method_not_allowed(uri: Uri) -> Problem {
    transport_problem(ErrorCode::MethodNotAllowed, &uri)
}

/// Buffer the inbound call. Size limits are enforced by the server layers.
async fn collect_inbound(request: Request) -> Result<InboundRequest, DomainError> {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX)
        .await
        .map_err(|e| DomainError::request_build("body", e.to_string()))?;
    Ok(InboundRequest::new(parts.method, parts.uri, parts.headers, body))
}

/// Turn a gateway result into an HTTP response.
///
/// `204` and `304` carry no body; everything else is JSON.
fn render(result: GatewayResponse, cookie: &SessionCookie) -> Response {
    let bodiless = result.response.is_bodiless();
    let (status, body) = result.response.into_parts();
    let mut response = if bodiless {
        status.into_response()
    } else {
        (status, Json(body)).into_response()
    };

    let set_cookie = match &result.session {
        SessionChange::Unchanged => None,
        SessionChange::Established(session) => cookie.issue(session),
        SessionChange::Terminated => cookie.expire(),
    };
    if let Some(value) = set_cookie {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

//! REST route registration for the core proxy.

use std::sync::Arc;

use axum::routing::{MethodFilter, MethodRouter, get, on};
use axum::{Extension, Router};

use super::handlers;
use super::session::SessionCookie;
use crate::domain::endpoint::Operation;
use crate::domain::service::Gateway;

const GET: MethodFilter = MethodFilter::GET;
const POST: MethodFilter = MethodFilter::POST;
const GET_POST: MethodFilter = MethodFilter::GET.or(MethodFilter::POST);
const ITEM_METHODS: MethodFilter = MethodFilter::GET
    .or(MethodFilter::PUT)
    .or(MethodFilter::PATCH)
    .or(MethodFilter::DELETE);

/// Routes without path parameters, relative to the API prefix.
const COLLECTION_ROUTES: [(&str, MethodFilter, Operation); 11] = [
    ("/users", POST, Operation::Register),
    ("/users/login", POST, Operation::Login),
    ("/users/logout", POST, Operation::Logout),
    ("/email-verification/verify", POST, Operation::EmailVerify),
    ("/users/email-verification/verify", POST, Operation::UserEmailVerify),
    ("/users/email-verification/check", GET, Operation::EmailVerifyCheck),
    ("/users/email-verification/resend", POST, Operation::EmailVerifyResend),
    ("/dialogues", GET_POST, Operation::Dialogues),
    ("/dialogues/", GET_POST, Operation::Dialogues),
    ("/bots", GET, Operation::Bots),
    ("/bots/", GET, Operation::Bots),
];

/// Routes addressed by a dialogue id, relative to the API prefix.
const DIALOGUE_ROUTES: [(&str, MethodFilter, Operation); 4] = [
    ("/dialogues/{id}", ITEM_METHODS, Operation::Dialogues),
    ("/dialogues/{id}/", ITEM_METHODS, Operation::Dialogues),
    ("/dialogues/{id}/messages", GET_POST, Operation::Messages),
    ("/dialogues/{id}/messages/", GET_POST, Operation::Messages),
];

/// Build the gateway router with every route under `prefix`.
///
/// Routes carry the full prefix instead of being nested so handlers see
/// the original request URI.
#[must_use]
pub fn router(
    svc: Arc<Gateway>,
    cookie: Arc<SessionCookie>,
    prefix: &str,
    admin_enabled: bool,
) -> Router {
    let prefix = prefix.trim_end_matches('/');
    let mut router = Router::new().route(&format!("{prefix}/health"), get(handlers::health));

    for (path, methods, operation) in COLLECTION_ROUTES {
        router = router.route(
            &format!("{prefix}{path}"),
            operation_route(on(methods, handlers::forward), operation),
        );
    }
    for (path, methods, operation) in DIALOGUE_ROUTES {
        router = router.route(
            &format!("{prefix}{path}"),
            operation_route(on(methods, handlers::forward_dialogue), operation),
        );
    }

    if admin_enabled {
        router = router.route(&format!("{prefix}/admin/logs"), get(handlers::list_audit_logs));
    }

    router
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .fallback(handlers::not_found)
        .layer(Extension(cookie))
        .layer(Extension(svc))
}

fn operation_route(route: MethodRouter, operation: Operation) -> MethodRouter {
    route.layer(Extension(operation))
}

//! Session cookie handling and caller extraction.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRequestParts;
use http::header::{COOKIE, HeaderValue};
use http::request::Parts;
use http::HeaderMap;
use proxy_errors::Problem;

use super::error::problem_at;
use crate::domain::error::DomainError;
use crate::domain::model::{Caller, SessionId};
use crate::domain::service::Gateway;

/// Name and lifetime of the cookie carrying the session id.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    max_age: Duration,
}

impl SessionCookie {
    #[must_use]
    pub fn new(name: impl Into<String>, max_age: Duration) -> Self {
        Self {
            name: name.into(),
            max_age,
        }
    }

    /// Session id sent by the caller, if any.
    #[must_use]
    pub fn read(&self, headers: &HeaderMap) -> Option<SessionId> {
        let prefix = format!("{}=", self.name);
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .filter_map(|cookie| cookie.trim().strip_prefix(&prefix))
            .find(|value| !value.is_empty())
            .map(SessionId::from)
    }

    /// `Set-Cookie` value establishing `session`.
    #[must_use]
    pub fn issue(&self, session: &SessionId) -> Option<HeaderValue> {
        self.render(session.as_str(), self.max_age.as_secs())
    }

    /// `Set-Cookie` value removing the session cookie.
    #[must_use]
    pub fn expire(&self) -> Option<HeaderValue> {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: u64) -> Option<HeaderValue> {
        let cookie = format!(
            "{}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
            self.name
        );
        match HeaderValue::from_str(&cookie) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!(error = %e, "Session cookie is not a valid header value");
                None
            }
        }
    }
}

/// The authenticated caller of the current request, if any.
#[derive(Debug, Clone)]
pub struct CurrentCaller(pub Option<Caller>);

impl<S> FromRequestParts<S> for CurrentCaller
where
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (Some(gateway), Some(cookie)) = (
            parts.extensions.get::<Arc<Gateway>>().cloned(),
            parts.extensions.get::<Arc<SessionCookie>>().cloned(),
        ) else {
            return Err(problem_at(
                DomainError::configuration("session layer is not installed"),
                &parts.uri,
            ));
        };

        let Some(session) = cookie.read(&parts.headers) else {
            return Ok(Self(None));
        };
        let caller = gateway
            .authenticate(session)
            .await
            .map_err(|e| problem_at(e, &parts.uri))?;
        Ok(Self(caller))
    }
}

//! Gateway service.
//!
//! Every operation runs the same pipeline: resolve the core path, forward
//! the call, normalize the answer, record the exchange, then apply the
//! operation's reaction (session handling, bot enrichment).

use std::sync::Arc;
use std::time::Instant;

use http::StatusCode;
use serde_json::{Value, json};
use tracing::{Instrument, info_span, instrument};
use url::Url;

use super::audit::{AuditEntry, AuditRecorder};
use super::bots::enrich_bots;
use super::endpoint::{Operation, PathParams, Reaction, resolve};
use super::error::DomainError;
use super::forward::build_forward;
use super::model::{
    Caller, Credential, GatewayResponse, InboundRequest, NormalizedResponse, Principal, SessionChange,
    SessionId,
};
use super::normalize::normalize;
use super::ports::{CoreClient, SessionStore};
use super::repo::{AuditLogReader, PrincipalRepository};
use crate::config::CoreProxyConfig;

/// Largest page served by the audit listing.
pub const MAX_AUDIT_PAGE: u64 = 500;

/// Service configuration extracted from module config.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Validated base URL of the core service.
    pub core_base_url: Url,
}

impl ServiceConfig {
    /// # Errors
    /// Returns `DomainError::Configuration` when the module config is invalid.
    pub fn from_config(cfg: &CoreProxyConfig) -> Result<Self, DomainError> {
        let core_base_url = cfg
            .validate()
            .map_err(|e| DomainError::configuration(e.to_string()))?;
        Ok(Self { core_base_url })
    }
}

/// Domain service composing the forwarding pipeline.
pub struct Gateway {
    core: Arc<dyn CoreClient>,
    principals: Arc<dyn PrincipalRepository>,
    sessions: Arc<dyn SessionStore>,
    audit_log: Arc<dyn AuditLogReader>,
    recorder: AuditRecorder,
    config: ServiceConfig,
}

impl Gateway {
    #[must_use]
    pub fn new(
        core: Arc<dyn CoreClient>,
        principals: Arc<dyn PrincipalRepository>,
        sessions: Arc<dyn SessionStore>,
        audit_log: Arc<dyn AuditLogReader>,
        recorder: AuditRecorder,
        config: ServiceConfig,
    ) -> Self {
        Self {
            core,
            principals,
            sessions,
            audit_log,
            recorder,
            config,
        }
    }

    /// Resolve a session id into the calling principal.
    ///
    /// Sessions pointing at a missing or inactive principal are ended.
    ///
    /// # Errors
    /// Returns `DomainError::Storage` when the principal lookup fails.
    pub async fn authenticate(&self, session: SessionId) -> Result<Option<Caller>, DomainError> {
        let Some(principal_id) = self.sessions.resolve(&session) else {
            return Ok(None);
        };
        match self.principals.find_by_id(principal_id).await? {
            Some(principal) if principal.is_active => Ok(Some(Caller {
                session_id: session,
                principal,
            })),
            _ => {
                tracing::debug!(%principal_id, "Session bound to unknown or inactive principal");
                self.sessions.terminate(&session);
                Ok(None)
            }
        }
    }

    /// Run one gateway operation.
    ///
    /// # Errors
    /// - `Unauthenticated` when the operation needs a caller and none is given
    /// - `RequestBuild` when the inbound call cannot be forwarded
    /// - `UpstreamUnavailable` / `UpstreamTimeout` on transport failures
    /// - `Storage` when a session reaction cannot be persisted
    #[instrument(
        skip(self, caller, inbound),
        fields(operation = %operation, method = %inbound.method, status_code)
    )]
    pub async fn handle(
        &self,
        operation: Operation,
        params: PathParams,
        caller: Option<&Caller>,
        inbound: InboundRequest,
    ) -> Result<GatewayResponse, DomainError> {
        let start = Instant::now();
        let spec = operation.spec();

        if spec.requires_auth && caller.is_none() {
            return Err(DomainError::Unauthenticated);
        }
        let login_email = if spec.reaction == Reaction::Login {
            Some(required_email(&inbound)?)
        } else {
            None
        };

        let path = resolve(operation, params);
        let credential = caller.and_then(|c| c.principal.credential.as_ref());
        let forwarded = build_forward(&self.config.core_base_url, &path, &inbound, credential)?;

        let core = self
            .core
            .send(&forwarded)
            .instrument(info_span!("core_call", core_url = %forwarded.url))
            .await?;
        let normalized = normalize(&core);
        self.recorder
            .record(&inbound, &forwarded, &core, &normalized)
            .await;

        let response = match spec.reaction {
            Reaction::PassThrough => GatewayResponse::unchanged(normalized),
            Reaction::EnrichBots => GatewayResponse::unchanged(enrich_bots(normalized)),
            Reaction::Register => {
                self.after_register(&inbound, &normalized).await;
                GatewayResponse::unchanged(normalized)
            }
            Reaction::Login => match login_email {
                Some(email) => self.after_login(&email, caller, normalized).await?,
                None => GatewayResponse::unchanged(normalized),
            },
            Reaction::Logout => match caller {
                Some(caller) => self.after_logout(caller, normalized).await?,
                None => GatewayResponse::unchanged(normalized),
            },
        };

        let status_code = response.response.status().as_u16();
        tracing::Span::current().record("status_code", status_code);
        tracing::info!(
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            status_code,
            "Operation completed"
        );
        Ok(response)
    }

    /// Audit entries for the admin listing, `limit` clamped to `1..=500`.
    ///
    /// # Errors
    /// Returns `DomainError::Storage` when the log cannot be read.
    pub async fn audit_entries(&self, limit: u64) -> Result<Vec<AuditEntry>, DomainError> {
        Ok(self.audit_log.list(limit.clamp(1, MAX_AUDIT_PAGE)).await?)
    }

    /// Persist the registered email locally. Failures are logged only.
    async fn after_register(&self, inbound: &InboundRequest, normalized: &NormalizedResponse) {
        if normalized.status() != StatusCode::OK {
            return;
        }
        let Some(email) = submitted_email(inbound) else {
            tracing::warn!("Registration succeeded without an email in the request body");
            return;
        };
        if let Err(e) = self.principal_for(&email).await {
            tracing::warn!(error = %e, "Failed to store registered principal");
        }
    }

    async fn after_login(
        &self,
        email: &str,
        caller: Option<&Caller>,
        normalized: NormalizedResponse,
    ) -> Result<GatewayResponse, DomainError> {
        if normalized.status() != StatusCode::OK {
            return Ok(GatewayResponse::unchanged(normalized));
        }
        let token = normalized
            .body()
            .pointer("/result/access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                DomainError::upstream_unavailable("login answer carried no access token")
            })?;

        let principal = self.principal_for(email).await?;
        if !principal.is_active {
            tracing::warn!(principal_id = %principal.id, "Login refused for inactive principal");
            return Err(DomainError::Unauthenticated);
        }
        self.principals
            .set_credential(principal.id, Some(Credential::new(token)))
            .await?;

        if let Some(previous) = caller {
            self.sessions.terminate(&previous.session_id);
        }
        let session = self.sessions.create(principal.id);
        tracing::info!(principal_id = %principal.id, "Session established");

        Ok(GatewayResponse {
            response: NormalizedResponse::new(StatusCode::OK, json!({ "status": "OK" })),
            session: SessionChange::Established(session),
        })
    }

    async fn after_logout(
        &self,
        caller: &Caller,
        normalized: NormalizedResponse,
    ) -> Result<GatewayResponse, DomainError> {
        if normalized.status() != StatusCode::NO_CONTENT {
            return Ok(GatewayResponse::unchanged(normalized));
        }
        self.principals
            .set_credential(caller.principal.id, None)
            .await?;
        self.sessions.terminate(&caller.session_id);
        tracing::info!(principal_id = %caller.principal.id, "Session terminated");

        Ok(GatewayResponse {
            response: normalized,
            session: SessionChange::Terminated,
        })
    }

    /// Find or create the principal for `email`.
    async fn principal_for(&self, email: &str) -> anyhow::Result<Principal> {
        if let Some(principal) = self.principals.find_by_email(email).await? {
            return Ok(principal);
        }
        match self.principals.create(email).await {
            Ok(principal) => Ok(principal),
            // A concurrent request may have inserted the same email.
            Err(e) => self.principals.find_by_email(email).await?.ok_or(e),
        }
    }
}

/// Trimmed `email` of a JSON request body.
fn submitted_email(inbound: &InboundRequest) -> Option<String> {
    inbound
        .json_body()?
        .get("email")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(ToOwned::to_owned)
}

/// Login needs the email up front to bind the session afterwards.
fn required_email(inbound: &InboundRequest) -> Result<String, DomainError> {
    submitted_email(inbound)
        .ok_or_else(|| DomainError::request_build("email", "a non-empty email is required"))
}

impl GatewayResponse {
    fn unchanged(response: NormalizedResponse) -> Self {
        Self {
            response,
            session: SessionChange::Unchanged,
        }
    }
}

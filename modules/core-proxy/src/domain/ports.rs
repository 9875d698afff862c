//! Output ports (interfaces) for domain services.

use async_trait::async_trait;
use uuid::Uuid;

use super::audit::AuditRecord;
use super::error::DomainError;
use super::model::{CoreResponse, ForwardedRequest, SessionId};

/// Port for the single outbound call to the core service.
#[async_trait]
pub trait CoreClient: Send + Sync {
    /// Send `request` and return the raw core response.
    ///
    /// Non-2xx answers are responses, not errors; only transport failures
    /// are reported as `DomainError`.
    async fn send(&self, request: &ForwardedRequest) -> Result<CoreResponse, DomainError>;
}

/// Write-only destination of audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn store(&self, record: AuditRecord) -> anyhow::Result<()>;
}

/// Server-side session registry keyed by an opaque id.
pub trait SessionStore: Send + Sync {
    /// Start a session for `principal_id`.
    fn create(&self, principal_id: Uuid) -> SessionId;

    /// Principal bound to `session`, `None` when unknown or expired.
    fn resolve(&self, session: &SessionId) -> Option<Uuid>;

    /// End `session`. Unknown ids are ignored.
    fn terminate(&self, session: &SessionId);
}

//! Repository traits for the core proxy domain.

use async_trait::async_trait;
use uuid::Uuid;

use super::audit::AuditEntry;
use super::model::{Credential, Principal};

/// Repository trait for locally known principals.
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Find a principal by ID.
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Principal>>;

    /// Find a principal by its unique email.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Principal>>;

    /// Insert a new active principal without a credential.
    async fn create(&self, email: &str) -> anyhow::Result<Principal>;

    /// Replace the stored credential; `None` clears it.
    async fn set_credential(&self, id: Uuid, credential: Option<Credential>)
    -> anyhow::Result<()>;
}

/// Read side of the audit log.
#[async_trait]
pub trait AuditLogReader: Send + Sync {
    /// Up to `limit` entries, ordered by id then proxy method.
    async fn list(&self, limit: u64) -> anyhow::Result<Vec<AuditEntry>>;
}

//! `SeaORM` storage of audit records.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, QuerySelect};

use super::entity::proxy_log;
use super::mapper::record_to_active_model;
use crate::domain::audit::{AuditEntry, AuditRecord};
use crate::domain::ports::AuditSink;
use crate::domain::repo::AuditLogReader;

/// `SeaORM` implementation of the audit log, both sink and reader.
pub struct SeaOrmAuditLog {
    conn: DatabaseConnection,
}

impl SeaOrmAuditLog {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl AuditSink for SeaOrmAuditLog {
    async fn store(&self, record: AuditRecord) -> anyhow::Result<()> {
        proxy_log::Entity::insert(record_to_active_model(record))
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AuditLogReader for SeaOrmAuditLog {
    async fn list(&self, limit: u64) -> anyhow::Result<Vec<AuditEntry>> {
        let models = proxy_log::Entity::find()
            .order_by_asc(proxy_log::Column::Id)
            .order_by_asc(proxy_log::Column::ProxyMethod)
            .limit(limit)
            .all(&self.conn)
            .await?;
        Ok(models.into_iter().map(AuditEntry::from).collect())
    }
}

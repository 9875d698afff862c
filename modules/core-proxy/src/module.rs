//! Core proxy module definition.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::rest::routes;
use crate::api::rest::session::SessionCookie;
use crate::config::CoreProxyConfig;
use crate::domain::audit::AuditRecorder;
use crate::domain::service::{Gateway, ServiceConfig};
use crate::infra::forwarder::ReqwestCoreClient;
use crate::infra::session::InMemorySessionStore;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::{SeaOrmAuditLog, SeaOrmPrincipalRepository};

/// Core proxy module.
///
/// Owns the gateway service, the session registry and the REST surface.
pub struct CoreProxy {
    gateway: Arc<Gateway>,
    sessions: Arc<InMemorySessionStore>,
    cookie: Arc<SessionCookie>,
    prefix: String,
    admin_enabled: bool,
}

impl CoreProxy {
    /// Validate `cfg`, migrate `db` and wire the gateway.
    ///
    /// # Errors
    /// Returns an error when the configuration is invalid, the HTTP client
    /// cannot be built or the migrations fail.
    pub async fn init(cfg: &CoreProxyConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        info!("Initializing core proxy module");

        let service_config = ServiceConfig::from_config(cfg)?;
        Self::migrate(&db).await?;

        let core = Arc::new(ReqwestCoreClient::new(
            cfg.connect_timeout(),
            cfg.request_timeout(),
        )?);
        let principals = Arc::new(SeaOrmPrincipalRepository::new(db.clone()));
        let audit_log = Arc::new(SeaOrmAuditLog::new(db));
        let sessions = Arc::new(InMemorySessionStore::new(cfg.session_ttl()));
        let recorder = AuditRecorder::new(
            audit_log.clone(),
            cfg.audit_max_latency(),
            cfg.audit_max_body_bytes,
        );

        let gateway = Arc::new(Gateway::new(
            core,
            principals,
            sessions.clone(),
            audit_log,
            recorder,
            service_config,
        ));
        info!(
            core_base_url = %cfg.core_base_url,
            api_prefix = %cfg.normalized_prefix(),
            "Core proxy module initialized"
        );

        Ok(Self {
            gateway,
            sessions,
            cookie: Arc::new(SessionCookie::new(
                cfg.session_cookie_name.clone(),
                cfg.session_ttl(),
            )),
            prefix: cfg.normalized_prefix().to_owned(),
            admin_enabled: cfg.audit_admin_enabled,
        })
    }

    /// Apply the module's schema migrations.
    ///
    /// # Errors
    /// Returns an error if a migration fails.
    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running core proxy database migrations");
        Migrator::up(db, None).await?;
        Ok(())
    }

    /// REST routes of the module, mounted under the configured prefix.
    #[must_use]
    pub fn router(&self) -> Router {
        info!(prefix = %self.prefix, admin = self.admin_enabled, "Registering core proxy REST routes");
        routes::router(
            self.gateway.clone(),
            self.cookie.clone(),
            &self.prefix,
            self.admin_enabled,
        )
    }

    #[must_use]
    pub fn gateway(&self) -> Arc<Gateway> {
        self.gateway.clone()
    }

    /// Periodically drop expired sessions until `cancel` fires.
    #[must_use]
    pub fn spawn_session_sweeper(
        &self,
        every: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let sessions = self.sessions.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        sessions.purge_expired();
                        tracing::trace!(active = sessions.len(), "Expired sessions purged");
                    }
                }
            }
            tracing::debug!("Session sweeper stopped");
        })
    }
}

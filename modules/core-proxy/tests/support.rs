#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Test support utilities for `core_proxy` integration tests.
//!
//! Provides an in-memory database, audit sinks with injected failures and a
//! fully wired router pointed at a mock core service.

#![allow(dead_code)] // Support module provides utilities that may not all be used

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use http::{Request, Response};
use http_body_util::BodyExt;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;

use core_proxy::api::rest::routes;
use core_proxy::api::rest::session::SessionCookie;
use core_proxy::config::CoreProxyConfig;
use core_proxy::domain::audit::{AuditRecord, AuditRecorder};
use core_proxy::domain::ports::AuditSink;
use core_proxy::domain::service::{Gateway, ServiceConfig};
use core_proxy::infra::forwarder::ReqwestCoreClient;
use core_proxy::infra::session::InMemorySessionStore;
use core_proxy::infra::storage::entity::principal;
use core_proxy::infra::storage::migrations::Migrator;
use core_proxy::infra::storage::{SeaOrmAuditLog, SeaOrmPrincipalRepository};

pub const PREFIX: &str = "/api/v1";
pub const COOKIE_NAME: &str = "sessionid";

/// Fresh migrated in-memory `SQLite` database.
pub async fn inmem_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Sink that always fails.
pub struct FailingAuditSink;

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn store(&self, _record: AuditRecord) -> anyhow::Result<()> {
        anyhow::bail!("audit storage is down")
    }
}

/// Sink that never finishes within the recorder's latency budget.
pub struct StalledAuditSink;

#[async_trait]
impl AuditSink for StalledAuditSink {
    async fn store(&self, _record: AuditRecord) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

/// A gateway wired against a mock core service.
pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub principals: Arc<SeaOrmPrincipalRepository>,
    pub audit_log: Arc<SeaOrmAuditLog>,
    pub sessions: Arc<InMemorySessionStore>,
}

/// Config pointing at `core_base_url` with the admin listing enabled.
pub fn config_for(core_base_url: &str) -> CoreProxyConfig {
    CoreProxyConfig {
        core_base_url: core_base_url.to_owned(),
        api_prefix: PREFIX.to_owned(),
        connect_timeout_ms: 1_000,
        request_timeout_ms: 2_000,
        audit_max_latency_ms: 200,
        audit_admin_enabled: true,
        ..Default::default()
    }
}

/// Build the app storing audit records in the database.
pub async fn build_app(core_base_url: &str) -> TestApp {
    build_app_with_sink(core_base_url, None).await
}

/// Build the app; `sink` replaces the database audit sink when given.
pub async fn build_app_with_sink(
    core_base_url: &str,
    sink: Option<Arc<dyn AuditSink>>,
) -> TestApp {
    let cfg = config_for(core_base_url);
    let db = inmem_db().await;

    let principals = Arc::new(SeaOrmPrincipalRepository::new(db.clone()));
    let audit_log = Arc::new(SeaOrmAuditLog::new(db.clone()));
    let sessions = Arc::new(InMemorySessionStore::new(cfg.session_ttl()));
    let sink: Arc<dyn AuditSink> = match sink {
        Some(sink) => sink,
        None => audit_log.clone(),
    };
    let recorder = AuditRecorder::new(sink, cfg.audit_max_latency(), cfg.audit_max_body_bytes);
    let core = ReqwestCoreClient::new(cfg.connect_timeout(), cfg.request_timeout()).unwrap();

    let gateway = Arc::new(Gateway::new(
        Arc::new(core),
        principals.clone(),
        sessions.clone(),
        audit_log.clone(),
        recorder,
        ServiceConfig::from_config(&cfg).unwrap(),
    ));
    let cookie = Arc::new(SessionCookie::new(COOKIE_NAME, cfg.session_ttl()));
    let router = routes::router(gateway, cookie, PREFIX, true);

    TestApp {
        router,
        db,
        principals,
        audit_log,
        sessions,
    }
}

impl TestApp {
    /// Mark the principal registered under `email` as inactive.
    pub async fn deactivate(&self, email: &str) {
        let result = principal::Entity::update_many()
            .col_expr(principal::Column::IsActive, Expr::value(false))
            .filter(principal::Column::Email.eq(email))
            .exec(&self.db)
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 1);
    }
}

/// JSON request to `path`, optionally carrying a session cookie.
pub fn json_request(method: &str, path: &str, body: &Value, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(CONTENT_TYPE, "application/json");
    if let Some(session) = session {
        builder = builder.header(COOKIE, format!("{COOKIE_NAME}={session}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Body-less request to `path`, optionally carrying a session cookie.
pub fn empty_request(method: &str, path: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(session) = session {
        builder = builder.header(COOKIE, format!("{COOKIE_NAME}={session}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Collect a response body as JSON; empty bodies become `Value::Null`.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

/// Session id from the response's `Set-Cookie` header.
pub fn session_from(response: &Response<Body>) -> Option<String> {
    let value = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    let pair = value.split(';').next()?;
    let session = pair.strip_prefix(&format!("{COOKIE_NAME}="))?;
    (!session.is_empty()).then(|| session.to_owned())
}

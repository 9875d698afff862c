//! REST DTOs for the core proxy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::audit::AuditEntry;

/// Health status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_owned(),
        }
    }
}

/// Query of `GET /admin/logs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<u64>,
}

impl AuditLogQuery {
    pub const DEFAULT_LIMIT: u64 = 50;

    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

/// One audited exchange as listed by the admin endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntryDto {
    pub id: i64,
    pub core_method: String,
    pub core_url: String,
    pub core_request_headers: String,
    pub core_request_body: String,
    pub proxy_method: String,
    pub proxy_url: String,
    pub proxy_request_headers: String,
    pub proxy_request_body: String,
    pub core_status: u16,
    pub core_response_headers: String,
    pub core_response_body: String,
    pub proxy_status: u16,
    pub proxy_response_headers: String,
    pub proxy_response_body: String,
    pub created_at: DateTime<Utc>,
}

impl From<AuditEntry> for AuditEntryDto {
    fn from(entry: AuditEntry) -> Self {
        let r = entry.record;
        Self {
            id: entry.id,
            core_method: r.core_method,
            core_url: r.core_url,
            core_request_headers: r.core_request_headers,
            core_request_body: r.core_request_body,
            proxy_method: r.proxy_method,
            proxy_url: r.proxy_url,
            proxy_request_headers: r.proxy_request_headers,
            proxy_request_body: r.proxy_request_body,
            core_status: r.core_status,
            core_response_headers: r.core_response_headers,
            core_response_body: r.core_response_body,
            proxy_status: r.proxy_status,
            proxy_response_headers: r.proxy_response_headers,
            proxy_response_body: r.proxy_response_body,
            created_at: r.created_at,
        }
    }
}

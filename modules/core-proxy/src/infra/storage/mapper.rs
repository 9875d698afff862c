//! Entity to domain model mappers.

use sea_orm::ActiveValue::{NotSet, Set};

use super::entity::{principal, proxy_log};
use crate::domain::audit::{AuditEntry, AuditRecord};
use crate::domain::model::{Credential, Principal};

/// Convert principal entity to domain model.
impl From<principal::Model> for Principal {
    fn from(model: principal::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            credential: model.access_token.map(Credential::new),
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

/// Convert proxy log entity to domain model.
impl From<proxy_log::Model> for AuditEntry {
    fn from(model: proxy_log::Model) -> Self {
        Self {
            id: model.id,
            record: AuditRecord {
                core_method: model.core_method,
                core_url: model.core_url,
                core_request_headers: model.core_request_headers,
                core_request_body: model.core_request_body,
                proxy_method: model.proxy_method,
                proxy_url: model.proxy_url,
                proxy_request_headers: model.proxy_request_headers,
                proxy_request_body: model.proxy_request_body,
                core_status: u16::try_from(model.core_status).unwrap_or_default(),
                core_response_headers: model.core_response_headers,
                core_response_body: model.core_response_body,
                proxy_status: u16::try_from(model.proxy_status).unwrap_or_default(),
                proxy_response_headers: model.proxy_response_headers,
                proxy_response_body: model.proxy_response_body,
                created_at: model.created_at,
            },
        }
    }
}

/// Convert an audit record to an insertable active model.
#[must_use]
pub fn record_to_active_model(record: AuditRecord) -> proxy_log::ActiveModel {
    proxy_log::ActiveModel {
        id: NotSet,
        core_method: Set(record.core_method),
        core_url: Set(record.core_url),
        core_request_headers: Set(record.core_request_headers),
        core_request_body: Set(record.core_request_body),
        proxy_method: Set(record.proxy_method),
        proxy_url: Set(record.proxy_url),
        proxy_request_headers: Set(record.proxy_request_headers),
        proxy_request_body: Set(record.proxy_request_body),
        core_status: Set(i32::from(record.core_status)),
        core_response_headers: Set(record.core_response_headers),
        core_response_body: Set(record.core_response_body),
        proxy_status: Set(i32::from(record.proxy_status)),
        proxy_response_headers: Set(record.proxy_response_headers),
        proxy_response_body: Set(record.proxy_response_body),
        created_at: Set(record.created_at),
    }
}

//! Storage infrastructure for the core proxy.

pub mod audit_repo;
pub mod entity;
pub mod mapper;
pub mod migrations;
pub mod principal_repo;

pub use audit_repo::SeaOrmAuditLog;
pub use principal_repo::SeaOrmPrincipalRepository;

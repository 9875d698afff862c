#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core Proxy Module
//!
//! An authenticating, auditing gateway in front of the core chat service.
//! Callers hold an opaque session cookie; the gateway keeps the core
//! service's bearer token server-side, forwards each call, normalizes the
//! answer and records the exchange.
//!
//! ```text
//!   caller ──cookie──▶ REST (/api/v1/...) ──▶ Gateway ──bearer──▶ core service
//!                                              │
//!                                  sessions ◀──┼──▶ audit log (SeaORM)
//! ```

// === MODULE DEFINITION ===
pub mod module;
pub use module::CoreProxy;

pub use api::rest::error::problem_for_bare_errors;
pub use config::{ConfigError, CoreProxyConfig};

// === INTERNAL MODULES ===
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;

//! Error payloads returned by the core proxy HTTP surface.
//!
//! Every failure the gateway reports to a caller is rendered as an
//! RFC 9457 problem document, so callers always receive a JSON body.

pub mod problem;

pub use problem::{APPLICATION_PROBLEM_JSON, ErrorCode, Problem, ValidationViolation};

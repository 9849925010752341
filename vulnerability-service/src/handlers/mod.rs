//! HTTP handlers for vulnerability-service.

pub mod health;
pub mod vulnerabilities;

pub use health::{health_check, metrics, readiness_check};

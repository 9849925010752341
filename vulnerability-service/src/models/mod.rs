//! Domain models for vulnerability-service.

mod domain;
mod identity;
mod organization;
mod vulnerability;

pub use domain::Domain;
pub use identity::{IdentityContext, RoleBinding, UserType};
pub use organization::{Organization, OrganizationSummary};
pub use vulnerability::{DomainSummary, Vulnerability, VulnerabilityRecord};

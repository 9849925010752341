//! Organization model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An organization whose internet-facing assets are monitored.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub root_domains: Vec<String>,
    pub ip_blocks: Vec<String>,
    pub is_passive: bool,
}

impl Organization {
    /// Create a new, active organization with no IP blocks.
    pub fn new(name: impl Into<String>, root_domains: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            name: name.into(),
            root_domains,
            ip_blocks: Vec::new(),
            is_passive: false,
        }
    }

    pub fn summary(&self) -> OrganizationSummary {
        OrganizationSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// The slice of an organization embedded in vulnerability views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSummary {
    pub id: Uuid,
    pub name: String,
}

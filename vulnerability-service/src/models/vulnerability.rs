//! Vulnerability model and its joined read view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::OrganizationSummary;

/// A vulnerability found on a domain by the scanning pipeline.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
    pub title: String,
    pub cve: Option<String>,
    pub cwe: Option<String>,
    pub cpe: Option<String>,
    pub description: String,
    pub cvss: Option<f64>,
    pub severity: Option<String>,
    pub state: String,
    pub substate: String,
    pub source: String,
    pub is_kev: Option<bool>,
    pub domain_id: Uuid,
}

impl Vulnerability {
    /// Create an open, unconfirmed vulnerability on `domain_id`.
    pub fn new(title: impl Into<String>, domain_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            last_seen: None,
            title: title.into(),
            cve: None,
            cwe: None,
            cpe: None,
            description: String::new(),
            cvss: None,
            severity: None,
            state: "open".to_string(),
            substate: "unconfirmed".to_string(),
            source: "unknown".to_string(),
            is_kev: None,
            domain_id,
        }
    }
}

/// Domain fields carried alongside a vulnerability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSummary {
    pub id: Uuid,
    pub name: String,
    pub organization: Option<OrganizationSummary>,
}

/// A vulnerability joined with its domain and, when attributed, the domain's
/// organization. This is the unit the query engine filters, scopes and returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub vulnerability: Vulnerability,
    pub domain: DomainSummary,
}

impl VulnerabilityRecord {
    /// Owning organization id, if the domain is attributed.
    pub fn organization_id(&self) -> Option<Uuid> {
        self.domain.organization.as_ref().map(|org| org.id)
    }
}

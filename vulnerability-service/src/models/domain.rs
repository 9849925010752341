//! Domain (internet-facing asset) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A host name discovered for an organization.
///
/// `organization_id` is `None` for domains that have not been attributed to
/// any organization yet.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Domain {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub ip: Option<String>,
    pub organization_id: Option<Uuid>,
}

impl Domain {
    pub fn new(name: impl Into<String>, organization_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            name: name.into(),
            ip: None,
            organization_id,
        }
    }
}

//! Single-record access guard.
//!
//! A record outside the caller's scope is reported exactly like a record that
//! does not exist. There is intentionally no "forbidden" outcome here.

use uuid::Uuid;

use super::{error::QueryError, scope::AccessScope};
use crate::models::VulnerabilityRecord;

/// Parse a record id from a path segment. Malformed ids cannot exist, so they
/// are reported as not found.
pub fn parse_record_id(raw: &str) -> Result<Uuid, QueryError> {
    Uuid::parse_str(raw).map_err(|_| QueryError::NotFound)
}

/// Release `record` to the caller only if `scope` permits its organization.
pub fn admit(
    scope: &AccessScope,
    record: Option<VulnerabilityRecord>,
) -> Result<VulnerabilityRecord, QueryError> {
    let record = record.ok_or(QueryError::NotFound)?;

    if scope.permits(record.organization_id()) {
        Ok(record)
    } else {
        tracing::debug!(
            vulnerability_id = %record.vulnerability.id,
            "Record outside caller scope"
        );
        Err(QueryError::NotFound)
    }
}

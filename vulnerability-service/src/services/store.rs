use async_trait::async_trait;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::VulnerabilityRecord;
use crate::query::SearchQuery;

/// Read access to vulnerabilities joined with their domain and organization.
///
/// Implementations must apply `query.scope` and `query.filter` to both the page
/// and the count, and order by `query.order` before applying `query.window`.
#[async_trait]
pub trait VulnerabilityStore: Send + Sync {
    /// Returns the requested page and the total number of matches.
    async fn search(&self, query: &SearchQuery)
        -> Result<(Vec<VulnerabilityRecord>, i64), AppError>;

    /// Unscoped lookup by id. Callers are responsible for scope checks.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<VulnerabilityRecord>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

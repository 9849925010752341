//! Query engine: composes scope, filter, ordering and pagination into one
//! store call.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    error::QueryError, filter::VulnerabilityFilter, guard, ordering::SortOrder,
    pagination::PageWindow, scope::AccessScope, SearchQuery,
};
use crate::models::{IdentityContext, VulnerabilityRecord};
use crate::services::VulnerabilityStore;

/// Default page size when the caller does not send one.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Raw search parameters as received from the caller.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub filters: Option<Value>,
    pub page_size: Option<i64>,
    pub page: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// One page of results plus the size of the full matching set.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub result: Vec<VulnerabilityRecord>,
    pub count: i64,
}

/// Stateless orchestrator; cheap to clone and safe to share across requests.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn VulnerabilityStore>,
    default_page_size: u32,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn VulnerabilityStore>) -> Self {
        Self::with_page_size(store, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(store: Arc<dyn VulnerabilityStore>, default_page_size: u32) -> Self {
        Self {
            store,
            default_page_size: default_page_size.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn VulnerabilityStore> {
        &self.store
    }

    /// Search vulnerabilities visible to `identity`.
    ///
    /// Validation happens before any I/O; `count` is the size of the full
    /// matching set regardless of the page window.
    #[instrument(skip(self, identity, params), fields(user_type = %identity.user_type))]
    pub async fn search(
        &self,
        identity: &IdentityContext,
        params: SearchParams,
    ) -> Result<SearchOutcome, QueryError> {
        let scope = AccessScope::resolve(identity);
        let filter = VulnerabilityFilter::compile(params.filters.as_ref())?;
        let window =
            PageWindow::normalize(params.page_size, params.page, self.default_page_size)?;
        let order = SortOrder::parse(params.sort.as_deref(), params.order.as_deref())?;

        if scope.is_empty() {
            debug!("Caller has no organization bindings; returning empty result");
            return Ok(SearchOutcome::default());
        }

        let query = SearchQuery {
            scope,
            filter,
            order,
            window,
        };

        let (result, count) = self.store.search(&query).await?;

        debug!(count = count, returned = result.len(), "Search completed");

        Ok(SearchOutcome { result, count })
    }

    /// Fetch one vulnerability, reporting out-of-scope records as not found.
    #[instrument(skip(self, identity), fields(user_type = %identity.user_type))]
    pub async fn get_by_id(
        &self,
        identity: &IdentityContext,
        id: Uuid,
    ) -> Result<VulnerabilityRecord, QueryError> {
        let record = self.store.find_by_id(id).await?;
        let scope = AccessScope::resolve(identity);
        guard::admit(&scope, record)
    }
}

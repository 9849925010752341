//! Authorization-scoped query engine.
//!
//! A request flows through [`scope`] (who may see what), [`filter`] (what the
//! caller asked for), [`ordering`] and [`pagination`] (which window of the
//! result), before [`engine`] hands one composed [`SearchQuery`] to the store.
//! Single-record reads go through [`guard`].

pub mod engine;
pub mod error;
pub mod filter;
pub mod guard;
pub mod ordering;
pub mod pagination;
pub mod scope;

pub use engine::{QueryEngine, SearchOutcome, SearchParams};
pub use error::QueryError;
pub use filter::VulnerabilityFilter;
pub use ordering::{SortDirection, SortKey, SortOrder};
pub use pagination::{PageSize, PageWindow};
pub use scope::AccessScope;

/// Everything the storage layer needs to run one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub scope: AccessScope,
    pub filter: VulnerabilityFilter,
    pub order: SortOrder,
    pub window: PageWindow,
}

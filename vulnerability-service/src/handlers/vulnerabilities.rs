//! Vulnerability read endpoints.
//!
//! Both handlers run behind `identity_middleware`, so an [`Identity`] is always
//! present.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    dtos::{SearchRequest, SearchResponse, VulnerabilityView},
    middleware::Identity,
    query::{guard, QueryError},
    services::metrics::{record_lookup, record_search},
    startup::AppState,
};

/// `POST /vulnerabilities/search`
pub async fn search_vulnerabilities(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, QueryError> {
    let outcome = match request.into_params() {
        Ok(params) => state.engine.search(&identity, params).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(outcome) => {
            record_search("ok");
            tracing::info!(
                count = outcome.count,
                returned = outcome.result.len(),
                "Vulnerability search served"
            );
            Ok(Json(SearchResponse::from(outcome)))
        }
        Err(e) => {
            record_search(e.kind());
            tracing::info!(error = %e, "Vulnerability search rejected");
            Err(e)
        }
    }
}

/// `GET /vulnerabilities/:id`
///
/// The id is taken as a raw string so a malformed id gets the same empty 404
/// as a missing or out-of-scope record.
pub async fn get_vulnerability(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(raw_id): Path<String>,
) -> Result<Json<VulnerabilityView>, QueryError> {
    let lookup = match guard::parse_record_id(&raw_id) {
        Ok(id) => state.engine.get_by_id(&identity, id).await,
        Err(e) => Err(e),
    };

    match lookup {
        Ok(record) => {
            record_lookup("found");
            Ok(Json(VulnerabilityView::from(record)))
        }
        Err(e) => {
            record_lookup(e.kind());
            Err(e)
        }
    }
}

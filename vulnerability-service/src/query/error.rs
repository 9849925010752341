//! Failures surfaced by the query engine.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Invalid sort: {0}")]
    InvalidSort(String),

    /// The record does not exist or is outside the caller's scope. The two
    /// cases are deliberately indistinguishable.
    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] AppError),
}

impl QueryError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFilter(_) => "invalid_filter",
            Self::InvalidPagination(_) => "invalid_pagination",
            Self::InvalidSort(_) => "invalid_sort",
            Self::NotFound => "not_found",
            Self::Storage(_) => "storage_error",
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        match self {
            // Empty body: nothing that could tell "absent" from "forbidden".
            QueryError::NotFound => StatusCode::NOT_FOUND.into_response(),
            QueryError::Storage(err) => err.into_response(),
            client_error => {
                AppError::BadRequest(anyhow::anyhow!(client_error.to_string())).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn not_found_has_empty_body() {
        let response = QueryError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn client_errors_map_to_400() {
        for err in [
            QueryError::InvalidFilter("title must be a string".to_string()),
            QueryError::InvalidPagination("pageSize must be positive or -1".to_string()),
            QueryError::InvalidSort("unknown sort key".to_string()),
        ] {
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn storage_errors_keep_app_error_status() {
        let err = QueryError::from(AppError::ServiceUnavailable);
        assert_eq!(err.kind(), "storage_error");
        assert_eq!(
            err.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}

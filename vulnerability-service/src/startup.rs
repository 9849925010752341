//! Application startup and lifecycle management.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::security_headers::security_headers_middleware;
use service_core::middleware::tracing::{request_id, request_id_middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::{StorageBackend, VulnerabilityConfig};
use crate::handlers;
use crate::middleware::identity_middleware;
use crate::query::QueryEngine;
use crate::services::{init_metrics, Database, InMemoryStore, TokenVerifier, VulnerabilityStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: VulnerabilityConfig,
    pub engine: QueryEngine,
    pub tokens: TokenVerifier,
}

impl AppState {
    pub fn new(config: VulnerabilityConfig, store: Arc<dyn VulnerabilityStore>) -> Self {
        Self {
            engine: QueryEngine::with_page_size(store, config.search.default_page_size),
            tokens: TokenVerifier::new(&config.auth.jwt_secret),
            config,
        }
    }
}

/// Build the HTTP router. Probe and metrics routes are public; everything
/// under `/vulnerabilities` requires a verified identity.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/vulnerabilities/search",
            post(handlers::vulnerabilities::search_vulnerabilities),
        )
        .route(
            "/vulnerabilities/:id",
            get(handlers::vulnerabilities::get_vulnerability),
        )
        .route_layer(from_fn_with_state(state.clone(), identity_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .merge(protected)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    request_id = %request_id(request.headers()),
                    method = %request.method(),
                    uri = %request.uri(),
                    user_type = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the store selected by configuration.
    pub async fn build(config: VulnerabilityConfig) -> Result<Self, AppError> {
        let store: Arc<dyn VulnerabilityStore> = match config.storage {
            StorageBackend::Postgres => {
                let db = Database::new(
                    &config.database.url,
                    config.database.max_connections,
                    config.database.min_connections,
                )
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                    e
                })?;

                db.run_migrations().await.map_err(|e| {
                    tracing::error!(error = %e, "Failed to run migrations");
                    e
                })?;

                Arc::new(db)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory store; data is not persisted");
                Arc::new(InMemoryStore::new())
            }
        };

        Self::build_with_store(config, store).await
    }

    /// Build the application around an already constructed store.
    pub async fn build_with_store(
        config: VulnerabilityConfig,
        store: Arc<dyn VulnerabilityStore>,
    ) -> Result<Self, AppError> {
        init_metrics();

        let addr = config.common.http_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let http_port = listener.local_addr()?.port();

        let router = build_router(AppState::new(config, store));

        tracing::info!(http_port = http_port, "Vulnerability service listener bound");

        Ok(Self {
            http_port,
            listener,
            router,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(
            service = "vulnerability-service",
            version = env!("CARGO_PKG_VERSION"),
            http_port = self.http_port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, self.router).await
    }
}

//! Configuration module for vulnerability-service.

use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

use crate::query::engine::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone)]
pub struct VulnerabilityConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub storage: StorageBackend,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub search: SearchConfig,
}

/// Where vulnerability data is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Empty in-process store, for local development only.
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub default_page_size: u32,
}

impl VulnerabilityConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let storage = match env::var("STORAGE_BACKEND").as_deref() {
            Err(_) | Ok("postgres") => StorageBackend::Postgres,
            Ok("memory") => StorageBackend::Memory,
            Ok(other) => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'",
                    other
                )))
            }
        };

        let database_url = match (env::var("DATABASE_URL"), storage) {
            (Ok(url), _) => url,
            (Err(_), StorageBackend::Memory) => String::new(),
            (Err(_), StorageBackend::Postgres) => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "DATABASE_URL is required"
                )))
            }
        };

        let default_page_size = match env::var("DEFAULT_PAGE_SIZE") {
            Err(_) => DEFAULT_PAGE_SIZE,
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| {
                    AppError::ConfigError(anyhow::anyhow!(
                        "DEFAULT_PAGE_SIZE must be a positive integer, got '{}'",
                        raw
                    ))
                })?,
        };

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "vulnerability-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            storage,
            database: DatabaseConfig {
                url: database_url,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(env::var("JWT_SECRET").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("JWT_SECRET is required"))
                })?),
            },
            search: SearchConfig { default_page_size },
        })
    }
}

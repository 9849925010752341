//! PostgreSQL store for vulnerability-service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use super::metrics::DB_QUERY_DURATION;
use super::VulnerabilityStore;
use crate::models::{DomainSummary, OrganizationSummary, Vulnerability, VulnerabilityRecord};
use crate::query::filter::{like_exact, like_substring};
use crate::query::SearchQuery;

const SELECT_RECORD: &str = r#"
    SELECT v.id, v.created_at, v.updated_at, v.last_seen, v.title, v.cve, v.cwe, v.cpe,
           v.description, v.cvss, v.severity, v.state, v.substate, v.source, v.is_kev,
           v.domain_id, d.name AS domain_name,
           o.id AS organization_id, o.name AS organization_name
    FROM vulnerability v
    JOIN domain d ON d.id = v.domain_id
    LEFT JOIN organization o ON o.id = d.organization_id
"#;

const COUNT_RECORDS: &str = r#"
    SELECT COUNT(*)
    FROM vulnerability v
    JOIN domain d ON d.id = v.domain_id
    LEFT JOIN organization o ON o.id = d.organization_id
"#;

/// Flat row produced by [`SELECT_RECORD`].
#[derive(Debug, FromRow)]
struct VulnerabilityRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_seen: Option<DateTime<Utc>>,
    title: String,
    cve: Option<String>,
    cwe: Option<String>,
    cpe: Option<String>,
    description: String,
    cvss: Option<f64>,
    severity: Option<String>,
    state: String,
    substate: String,
    source: String,
    is_kev: Option<bool>,
    domain_id: Uuid,
    domain_name: String,
    organization_id: Option<Uuid>,
    organization_name: Option<String>,
}

impl From<VulnerabilityRow> for VulnerabilityRecord {
    fn from(row: VulnerabilityRow) -> Self {
        let organization = match (row.organization_id, row.organization_name) {
            (Some(id), Some(name)) => Some(OrganizationSummary { id, name }),
            _ => None,
        };

        Self {
            vulnerability: Vulnerability {
                id: row.id,
                created_at: row.created_at,
                updated_at: row.updated_at,
                last_seen: row.last_seen,
                title: row.title,
                cve: row.cve,
                cwe: row.cwe,
                cpe: row.cpe,
                description: row.description,
                cvss: row.cvss,
                severity: row.severity,
                state: row.state,
                substate: row.substate,
                source: row.source,
                is_kev: row.is_kev,
                domain_id: row.domain_id,
            },
            domain: DomainSummary {
                id: row.domain_id,
                name: row.domain_name,
                organization,
            },
        }
    }
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "vulnerability-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

/// ASCII-only case folding in SQL. `lower`/`ILIKE` follow the database
/// locale, `translate` does not.
const FOLD_FROM: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const FOLD_TO: &str = "abcdefghijklmnopqrstuvwxyz";

/// `AND translate(<column>, A-Z, a-z) LIKE <pattern>`. `column` is always a
/// fixed string from this module; the pattern is bound and already folded.
fn push_folded_like(
    builder: &mut QueryBuilder<'_, Postgres>,
    column: &'static str,
    pattern: String,
) {
    builder
        .push(" AND translate(")
        .push(column)
        .push(", '")
        .push(FOLD_FROM)
        .push("', '")
        .push(FOLD_TO)
        .push("') LIKE ")
        .push_bind(pattern);
}

/// Append the scope and filter predicates. Every caller-supplied value is a
/// bind parameter; only fixed SQL text is pushed verbatim.
fn push_predicates(builder: &mut QueryBuilder<'_, Postgres>, query: &SearchQuery) {
    builder.push(" WHERE TRUE");

    if let Some(orgs) = query.scope.organization_ids() {
        builder
            .push(" AND d.organization_id = ANY(")
            .push_bind(orgs)
            .push(")");
    }

    let filter = &query.filter;

    if let Some(id) = filter.id {
        builder.push(" AND v.id = ").push_bind(id);
    }
    if let Some(title) = &filter.title {
        push_folded_like(builder, "v.title", like_substring(title));
    }
    if let Some(domain) = &filter.domain {
        push_folded_like(builder, "d.name", like_substring(domain));
    }
    if let Some(cpe) = &filter.cpe {
        push_folded_like(builder, "v.cpe", like_substring(cpe));
    }
    if let Some(severity) = &filter.severity {
        push_folded_like(builder, "v.severity", like_exact(severity));
    }
    if let Some(state) = &filter.state {
        push_folded_like(builder, "v.state", like_exact(state));
    }
    if let Some(substate) = &filter.substate {
        push_folded_like(builder, "v.substate", like_exact(substate));
    }
    if let Some(org) = filter.organization {
        builder.push(" AND d.organization_id = ").push_bind(org);
    }
    if let Some(is_kev) = filter.is_kev {
        builder.push(" AND v.is_kev = ").push_bind(is_kev);
    }
}

#[async_trait]
impl VulnerabilityStore for Database {
    #[instrument(skip(self, query), fields(scope = ?query.scope, window = ?query.window))]
    async fn search(
        &self,
        query: &SearchQuery,
    ) -> Result<(Vec<VulnerabilityRecord>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["search_count"])
            .start_timer();

        let mut count_query = QueryBuilder::<Postgres>::new(COUNT_RECORDS);
        push_predicates(&mut count_query, query);

        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to count vulnerabilities: {}", e))
            })?;

        timer.observe_duration();

        let timer = DB_QUERY_DURATION
            .with_label_values(&["search_page"])
            .start_timer();

        let mut page_query = QueryBuilder::<Postgres>::new(SELECT_RECORD);
        push_predicates(&mut page_query, query);
        page_query.push(" ORDER BY ").push(query.order.to_sql());
        // LIMIT NULL is LIMIT ALL
        page_query
            .push(" LIMIT ")
            .push_bind(query.window.limit())
            .push(" OFFSET ")
            .push_bind(query.window.offset() as i64);

        let rows: Vec<VulnerabilityRow> = page_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to search vulnerabilities: {}", e))
            })?;

        timer.observe_duration();

        Ok((rows.into_iter().map(VulnerabilityRecord::from).collect(), count))
    }

    #[instrument(skip(self), fields(vulnerability_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<VulnerabilityRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_by_id"])
            .start_timer();

        let mut builder = QueryBuilder::<Postgres>::new(SELECT_RECORD);
        builder.push(" WHERE v.id = ").push_bind(id);

        let row: Option<VulnerabilityRow> = builder
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to get vulnerability: {}", e))
            })?;

        timer.observe_duration();

        Ok(row.map(VulnerabilityRecord::from))
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{AccessScope, PageWindow, SortOrder, VulnerabilityFilter};

    fn rendered(filter: VulnerabilityFilter) -> String {
        let query = SearchQuery {
            scope: AccessScope::Unrestricted,
            filter,
            order: SortOrder::default(),
            window: PageWindow::Unlimited,
        };
        let mut builder = QueryBuilder::<Postgres>::new(COUNT_RECORDS);
        push_predicates(&mut builder, &query);
        builder.sql().to_string()
    }

    #[test]
    fn text_filters_fold_with_translate_not_ilike() {
        let sql = rendered(VulnerabilityFilter {
            title: Some("Remote".to_string()),
            state: Some("OPEN".to_string()),
            ..Default::default()
        });

        assert!(!sql.contains("ILIKE"));
        assert!(sql.contains(
            "translate(v.title, 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz') LIKE $1"
        ));
        assert!(sql.contains("translate(v.state, "));
    }

    #[test]
    fn restricted_scope_binds_organization_ids() {
        let query = SearchQuery {
            scope: AccessScope::RestrictedTo([Uuid::new_v4()].into_iter().collect()),
            filter: VulnerabilityFilter::default(),
            order: SortOrder::default(),
            window: PageWindow::Unlimited,
        };
        let mut builder = QueryBuilder::<Postgres>::new(COUNT_RECORDS);
        push_predicates(&mut builder, &query);

        assert!(builder.sql().contains("d.organization_id = ANY($1)"));
    }
}

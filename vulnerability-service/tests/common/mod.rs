//! Common test utilities for vulnerability-service integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::Secret;
use serde_json::Value;
use service_core::config::Config as CommonConfig;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Once};
use tower::ServiceExt;
use uuid::Uuid;
use vulnerability_service::config::{
    AuthConfig, DatabaseConfig, SearchConfig, StorageBackend, VulnerabilityConfig,
};
use vulnerability_service::models::{
    Domain, IdentityContext, Organization, RoleBinding, UserType, Vulnerability,
};
use vulnerability_service::query::QueryEngine;
use vulnerability_service::services::{InMemoryStore, UserClaims};
use vulnerability_service::startup::{build_router, AppState};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,vulnerability_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn test_config(storage: StorageBackend, database_url: String) -> VulnerabilityConfig {
    VulnerabilityConfig {
        common: CommonConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        },
        service_name: "vulnerability-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        storage,
        database: DatabaseConfig {
            url: database_url,
            max_connections: 2,
            min_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: Secret::new(TEST_JWT_SECRET.to_string()),
        },
        search: SearchConfig {
            default_page_size: 25,
        },
    }
}

/// Seeded in-memory world: organizations, domains and vulnerabilities.
pub struct World {
    pub store: Arc<InMemoryStore>,
}

impl World {
    pub fn new() -> Self {
        init_tracing();
        Self {
            store: Arc::new(InMemoryStore::new()),
        }
    }

    pub fn organization(&self, name: &str) -> Uuid {
        let org = Organization::new(name, vec![]);
        let id = org.id;
        self.store.insert_organization(org).unwrap();
        id
    }

    pub fn domain(&self, name: &str, organization: Option<Uuid>) -> Uuid {
        let domain = Domain::new(name, organization);
        let id = domain.id;
        self.store.insert_domain(domain).unwrap();
        id
    }

    pub fn vulnerability(&self, title: &str, domain: Uuid) -> Uuid {
        self.insert(Vulnerability::new(title, domain))
    }

    pub fn insert(&self, vulnerability: Vulnerability) -> Uuid {
        let id = vulnerability.id;
        self.store.insert_vulnerability(vulnerability).unwrap();
        id
    }

    pub fn engine(&self) -> QueryEngine {
        QueryEngine::new(self.store.clone())
    }

    pub fn router(&self) -> Router {
        let config = test_config(StorageBackend::Memory, String::new());
        build_router(AppState::new(config, self.store.clone()))
    }
}

pub fn standard_user(orgs: &[Uuid]) -> IdentityContext {
    IdentityContext::member_of(orgs.iter().copied())
}

pub fn global_view_user() -> IdentityContext {
    IdentityContext::global_view()
}

/// Sign an access token the way the auth service does. A one-hour expiry is
/// added when `claims` carries none.
pub fn token_for(claims: &UserClaims) -> String {
    let claims = UserClaims {
        exp: claims
            .exp
            .or(Some(chrono::Utc::now().timestamp() + 3600)),
        ..claims.clone()
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

pub fn standard_token(orgs: &[Uuid]) -> String {
    token_for(&UserClaims {
        id: Some(Uuid::new_v4().to_string()),
        roles: orgs
            .iter()
            .map(|org| RoleBinding {
                org: *org,
                role: "user".to_string(),
            })
            .collect(),
        ..Default::default()
    })
}

pub fn global_view_token() -> String {
    token_for(&UserClaims {
        id: Some(Uuid::new_v4().to_string()),
        user_type: Some(UserType::GlobalView),
        ..Default::default()
    })
}

/// Send one request through the router and return status and raw body.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed to respond");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    (status, bytes.to_vec())
}

pub fn search_request(token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/vulnerabilities/search")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

pub fn get_request(token: Option<&str>, id: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri(format!("/vulnerabilities/{}", id));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token.to_string());
    }
    builder.body(Body::empty()).expect("Failed to build request")
}

/// Running server backed by PostgreSQL, plus a pool for seeding rows.
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub db: vulnerability_service::services::Database,
}

/// Spawn the service against `TEST_DATABASE_URL`. Migrations run on build.
pub async fn spawn_app() -> TestApp {
    use vulnerability_service::services::Database;
    use vulnerability_service::startup::Application;

    init_tracing();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run PostgreSQL tests");
    let config = test_config(StorageBackend::Postgres, database_url.clone());

    let app = Application::build(config)
        .await
        .expect("Failed to build application");
    let address = format!("http://127.0.0.1:{}", app.http_port());

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    let db = Database::new(&database_url, 2, 1)
        .await
        .expect("Failed to connect to test database");

    TestApp {
        address,
        client: reqwest::Client::new(),
        db,
    }
}

impl TestApp {
    pub async fn insert_organization(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO organization (id, name) VALUES ($1, $2)")
            .bind(id)
            .bind(name)
            .execute(self.db.pool())
            .await
            .expect("Failed to insert organization");
        id
    }

    pub async fn insert_domain(&self, name: &str, organization: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO domain (id, name, organization_id) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(name)
            .bind(organization)
            .execute(self.db.pool())
            .await
            .expect("Failed to insert domain");
        id
    }

    pub async fn insert_vulnerability(&self, title: &str, domain: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO vulnerability (id, title, domain_id) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(title)
            .bind(domain)
            .execute(self.db.pool())
            .await
            .expect("Failed to insert vulnerability");
        id
    }

    pub async fn insert_full(&self, v: &Vulnerability) {
        sqlx::query(
            r#"
            INSERT INTO vulnerability (id, created_at, updated_at, title, cpe, description,
                                       cvss, severity, state, substate, source, is_kev, domain_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(v.id)
        .bind(v.created_at)
        .bind(v.updated_at)
        .bind(&v.title)
        .bind(&v.cpe)
        .bind(&v.description)
        .bind(v.cvss)
        .bind(&v.severity)
        .bind(&v.state)
        .bind(&v.substate)
        .bind(&v.source)
        .bind(v.is_kev)
        .bind(v.domain_id)
        .execute(self.db.pool())
        .await
        .expect("Failed to insert vulnerability");
    }

    pub async fn search(&self, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}/vulnerabilities/search", self.address))
            .header("Authorization", token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, token: &str, id: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/vulnerabilities/{}", self.address, id))
            .header("Authorization", token)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Three rows that between them exercise every filter key and null placement
/// for the nullable sort keys. `shop` and `blog` must belong to different
/// organizations.
pub fn filter_rows(shop: Uuid, blog: Uuid) -> Vec<Vulnerability> {
    let mut sqli = Vulnerability::new("SQL injection", shop);
    sqli.severity = Some("High".to_string());
    sqli.cpe = Some("cpe:/a:x:widget".to_string());
    sqli.is_kev = Some(true);
    sqli.cvss = Some(9.1);

    let mut redirect = Vulnerability::new("Open redirect", blog);
    redirect.severity = Some("Low".to_string());
    redirect.state = "closed".to_string();
    redirect.substate = "remediated".to_string();
    redirect.is_kev = Some(false);
    redirect.cvss = Some(3.1);

    let mut banner = Vulnerability::new("ÉCOLE banner", shop);
    banner.substate = "confirmed".to_string();

    vec![sqli, redirect, banner]
}

/// `(filters, expected row indices)` for [`filter_rows`].
pub fn filter_cases(rows: &[Vulnerability], blog_org: Uuid) -> Vec<(Value, Vec<usize>)> {
    use serde_json::json;

    vec![
        (json!({ "severity": "high" }), vec![0]),
        (json!({ "state": "CLOSED" }), vec![1]),
        (json!({ "substate": "Remediated" }), vec![1]),
        (json!({ "isKev": true }), vec![0]),
        (json!({ "isKev": false }), vec![1]),
        (json!({ "cpe": "A:X" }), vec![0]),
        (json!({ "domain": "BLOG" }), vec![1]),
        (json!({ "organization": blog_org.to_string() }), vec![1]),
        (json!({ "id": rows[2].id.to_string() }), vec![2]),
        (json!({ "title": "Écol" }), vec![2]),
        (json!({ "title": "école" }), vec![]),
    ]
}

/// `(sort, order, expected row order)` for [`filter_rows`].
pub fn sort_cases() -> Vec<(&'static str, &'static str, Vec<usize>)> {
    vec![
        ("cvss", "ASC", vec![1, 0, 2]),
        ("cvss", "DESC", vec![2, 0, 1]),
        ("severity", "ASC", vec![0, 1, 2]),
        ("severity", "DESC", vec![2, 1, 0]),
        ("title", "ASC", vec![1, 0, 2]),
    ]
}

/// Ids in a search response body, in order.
pub fn result_ids(body: &Value) -> Vec<String> {
    body["result"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn expected_ids(rows: &[Vulnerability], indices: &[usize]) -> Vec<String> {
    indices.iter().map(|i| rows[*i].id.to_string()).collect()
}

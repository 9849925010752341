//! Wire types for the vulnerability endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{OrganizationSummary, VulnerabilityRecord};
use crate::query::{QueryError, SearchOutcome, SearchParams};

/// Body of `POST /vulnerabilities/search`.
///
/// `pageSize` and `page` are kept as raw JSON so a non-integer value is
/// reported as a pagination error rather than a generic body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub filters: Option<Value>,
    #[serde(default)]
    pub page_size: Option<Value>,
    #[serde(default)]
    pub page: Option<Value>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
}

impl SearchRequest {
    pub fn into_params(self) -> Result<SearchParams, QueryError> {
        Ok(SearchParams {
            page_size: integer_field("pageSize", self.page_size)?,
            page: integer_field("page", self.page)?,
            filters: self.filters,
            sort: self.sort,
            order: self.order,
        })
    }
}

fn integer_field(name: &str, value: Option<Value>) -> Result<Option<i64>, QueryError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| {
            QueryError::InvalidPagination(format!("{} must be an integer, got {}", name, n))
        }),
        Some(other) => Err(QueryError::InvalidPagination(format!(
            "{} must be an integer, got {}",
            name, other
        ))),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub count: i64,
    pub result: Vec<VulnerabilityView>,
}

impl From<SearchOutcome> for SearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        Self {
            count: outcome.count,
            result: outcome
                .result
                .into_iter()
                .map(VulnerabilityView::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
    pub title: String,
    pub cve: Option<String>,
    pub cwe: Option<String>,
    pub cpe: Option<String>,
    pub description: String,
    pub cvss: Option<f64>,
    pub severity: Option<String>,
    pub state: String,
    pub substate: String,
    pub source: String,
    pub is_kev: Option<bool>,
    pub domain: DomainView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DomainView {
    pub id: Uuid,
    pub name: String,
    pub organization: Option<OrganizationSummary>,
}

impl From<VulnerabilityRecord> for VulnerabilityView {
    fn from(record: VulnerabilityRecord) -> Self {
        let VulnerabilityRecord {
            vulnerability: v,
            domain,
        } = record;

        Self {
            id: v.id,
            created_at: v.created_at,
            updated_at: v.updated_at,
            last_seen: v.last_seen,
            title: v.title,
            cve: v.cve,
            cwe: v.cwe,
            cpe: v.cpe,
            description: v.description,
            cvss: v.cvss,
            severity: v.severity,
            state: v.state,
            substate: v.substate,
            source: v.source,
            is_kev: v.is_kev,
            domain: DomainView {
                id: domain.id,
                name: domain.name,
                organization: domain.organization,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_yields_default_params() {
        let request: SearchRequest = serde_json::from_value(json!({})).unwrap();
        let params = request.into_params().unwrap();
        assert!(params.filters.is_none());
        assert!(params.page_size.is_none());
        assert!(params.page.is_none());
    }

    #[test]
    fn reads_camel_case_fields() {
        let request: SearchRequest = serde_json::from_value(json!({
            "filters": { "title": "xss" },
            "pageSize": -1,
            "page": 2,
            "sort": "title",
            "order": "ASC"
        }))
        .unwrap();

        let params = request.into_params().unwrap();
        assert_eq!(params.page_size, Some(-1));
        assert_eq!(params.page, Some(2));
        assert_eq!(params.sort.as_deref(), Some("title"));
        assert_eq!(params.filters, Some(json!({ "title": "xss" })));
    }

    #[test]
    fn non_integer_page_size_is_a_pagination_error() {
        for page_size in [json!("ten"), json!(2.5), json!(true)] {
            let request: SearchRequest =
                serde_json::from_value(json!({ "pageSize": page_size })).unwrap();
            assert!(matches!(
                request.into_params(),
                Err(QueryError::InvalidPagination(_))
            ));
        }
    }

    #[test]
    fn view_nests_domain_and_organization() {
        use crate::models::{DomainSummary, Vulnerability};

        let org = OrganizationSummary {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
        };
        let domain_id = Uuid::new_v4();
        let record = VulnerabilityRecord {
            vulnerability: Vulnerability::new("Weak TLS", domain_id),
            domain: DomainSummary {
                id: domain_id,
                name: "mail.acme.example".to_string(),
                organization: Some(org.clone()),
            },
        };

        let body = serde_json::to_value(VulnerabilityView::from(record)).unwrap();
        assert_eq!(body["title"], "Weak TLS");
        assert_eq!(body["domain"]["name"], "mail.acme.example");
        assert_eq!(body["domain"]["organization"]["name"], "Acme");
        assert!(body.get("createdAt").is_some());
        assert!(body.get("isKev").is_some());
    }
}

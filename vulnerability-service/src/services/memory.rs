//! In-process store, used for local runs (`STORAGE_BACKEND=memory`) and tests.

use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::VulnerabilityStore;
use crate::models::{Domain, DomainSummary, Organization, Vulnerability, VulnerabilityRecord};
use crate::query::SearchQuery;

#[derive(Default)]
struct Tables {
    organizations: HashMap<Uuid, Organization>,
    domains: HashMap<Uuid, Domain>,
    vulnerabilities: HashMap<Uuid, Vulnerability>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_organization(&self, organization: Organization) -> Result<(), AppError> {
        self.write()?
            .organizations
            .insert(organization.id, organization);
        Ok(())
    }

    /// Insert a domain. Its organization, if any, must already exist.
    pub fn insert_domain(&self, domain: Domain) -> Result<(), AppError> {
        let mut tables = self.write()?;
        if let Some(org) = domain.organization_id {
            if !tables.organizations.contains_key(&org) {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Organization {} does not exist",
                    org
                )));
            }
        }
        tables.domains.insert(domain.id, domain);
        Ok(())
    }

    /// Insert a vulnerability. Its domain must already exist.
    pub fn insert_vulnerability(&self, vulnerability: Vulnerability) -> Result<(), AppError> {
        let mut tables = self.write()?;
        if !tables.domains.contains_key(&vulnerability.domain_id) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Domain {} does not exist",
                vulnerability.domain_id
            )));
        }
        tables.vulnerabilities.insert(vulnerability.id, vulnerability);
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("In-memory store poisoned")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("In-memory store poisoned")))
    }
}

impl Tables {
    fn join(&self, vulnerability: &Vulnerability) -> Option<VulnerabilityRecord> {
        let domain = self.domains.get(&vulnerability.domain_id)?;
        let organization = domain
            .organization_id
            .and_then(|id| self.organizations.get(&id))
            .map(Organization::summary);

        Some(VulnerabilityRecord {
            vulnerability: vulnerability.clone(),
            domain: DomainSummary {
                id: domain.id,
                name: domain.name.clone(),
                organization,
            },
        })
    }
}

#[async_trait]
impl VulnerabilityStore for InMemoryStore {
    async fn search(
        &self,
        query: &SearchQuery,
    ) -> Result<(Vec<VulnerabilityRecord>, i64), AppError> {
        let tables = self.read()?;

        let mut matches: Vec<VulnerabilityRecord> = tables
            .vulnerabilities
            .values()
            .filter_map(|vulnerability| tables.join(vulnerability))
            .filter(|record| query.scope.permits(record.organization_id()))
            .filter(|record| query.filter.matches(record))
            .collect();

        matches.sort_by(|a, b| query.order.compare(a, b));

        let count = matches.len() as i64;
        Ok((query.window.slice(matches), count))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<VulnerabilityRecord>, AppError> {
        let tables = self.read()?;
        Ok(tables
            .vulnerabilities
            .get(&id)
            .and_then(|vulnerability| tables.join(vulnerability)))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.read().map(|_| ())
    }
}

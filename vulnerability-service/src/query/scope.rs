//! Scope resolution: identity → organization visibility predicate.

use crate::models::IdentityContext;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Organizations whose data a caller may read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    /// Global view: every organization plus unattributed domains.
    Unrestricted,
    /// Only data owned by these organizations. Unattributed domains never
    /// match, and an empty set matches nothing.
    RestrictedTo(BTreeSet<Uuid>),
}

impl AccessScope {
    /// Resolve the scope for `identity`. Pure; absence of roles is a valid,
    /// maximally restrictive state rather than an error.
    pub fn resolve(identity: &IdentityContext) -> Self {
        if identity.user_type.has_global_view() {
            AccessScope::Unrestricted
        } else {
            AccessScope::RestrictedTo(identity.organizations.clone())
        }
    }

    /// Whether data owned by `organization_id` (None = unattributed) is visible.
    pub fn permits(&self, organization_id: Option<Uuid>) -> bool {
        match self {
            AccessScope::Unrestricted => true,
            AccessScope::RestrictedTo(orgs) => {
                organization_id.is_some_and(|org| orgs.contains(&org))
            }
        }
    }

    /// True when no record can ever satisfy this scope.
    pub fn is_empty(&self) -> bool {
        matches!(self, AccessScope::RestrictedTo(orgs) if orgs.is_empty())
    }

    /// Organization ids to restrict on, or `None` when unrestricted.
    pub fn organization_ids(&self) -> Option<Vec<Uuid>> {
        match self {
            AccessScope::Unrestricted => None,
            AccessScope::RestrictedTo(orgs) => Some(orgs.iter().copied().collect()),
        }
    }
}

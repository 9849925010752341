//! Caller identity as seen by the query engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Principal type carried in the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserType {
    #[default]
    Standard,
    GlobalView,
    GlobalAdmin,
}

impl UserType {
    /// Whether this principal may read every organization's data.
    pub fn has_global_view(self) -> bool {
        matches!(self, Self::GlobalView | Self::GlobalAdmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::GlobalView => "globalView",
            Self::GlobalAdmin => "globalAdmin",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Membership of a user in an organization. Any role name grants read access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub org: Uuid,
    pub role: String,
}

/// Verified caller identity, computed once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    pub user_id: Option<String>,
    pub user_type: UserType,
    pub organizations: BTreeSet<Uuid>,
}

impl IdentityContext {
    pub fn new(user_id: Option<String>, user_type: UserType, roles: &[RoleBinding]) -> Self {
        Self {
            user_id,
            user_type,
            organizations: roles.iter().map(|binding| binding.org).collect(),
        }
    }

    /// A global-view principal.
    pub fn global_view() -> Self {
        Self::new(None, UserType::GlobalView, &[])
    }

    /// A standard user bound to `organizations`.
    pub fn member_of(organizations: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            user_id: None,
            user_type: UserType::Standard,
            organizations: organizations.into_iter().collect(),
        }
    }
}

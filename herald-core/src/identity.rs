//! Caller identity, roles and the scopes they grant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::SubsidiaryId;

/// Access scope checked by the permission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Any document, any action.
    All,
    /// Any content document.
    Content,
    /// Only the subsidiary document bound to the caller's department.
    Subsidiary,
    /// User administration only.
    Users,
}

/// Administrative role of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    ContentManager,
    SubsidiaryAdmin,
    UserManager,
    #[default]
    Viewer,
}

impl Role {
    pub fn scopes(self) -> &'static [Scope] {
        match self {
            Role::SuperAdmin => &[Scope::All],
            Role::ContentManager => &[Scope::Content],
            Role::SubsidiaryAdmin => &[Scope::Subsidiary],
            Role::UserManager => &[Scope::Users],
            Role::Viewer => &[],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::SuperAdmin => "super_admin",
            Role::ContentManager => "content_manager",
            Role::SubsidiaryAdmin => "subsidiary_admin",
            Role::UserManager => "user_manager",
            Role::Viewer => "viewer",
        };
        f.write_str(name)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "super_admin" => Ok(Role::SuperAdmin),
            "content_manager" => Ok(Role::ContentManager),
            "subsidiary_admin" => Ok(Role::SubsidiaryAdmin),
            "user_manager" => Ok(Role::UserManager),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!(
                "unknown role '{other}'; expected: super_admin, content_manager, subsidiary_admin, user_manager, viewer"
            )),
        }
    }
}

/// The caller as seen by the permission gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<SubsidiaryId>,
}

impl Identity {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
            department: None,
        }
    }

    pub fn with_department(mut self, department: SubsidiaryId) -> Self {
        self.department = Some(department);
        self
    }
}

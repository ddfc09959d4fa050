//! Role definitions and the application-level role registry.
//!
//! Roles are configuration, not data: the application registers its role
//! catalog once at startup and membership rows store only the key.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::TeamError;

/// A named role with its permission strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Stable key stored on membership rows, e.g. `"editor"`.
    pub key: String,
    /// Human-readable name, e.g. `"Editor"`.
    pub name: String,
    pub permissions: Vec<String>,
}

impl RoleDefinition {
    pub fn new(key: &str, name: &str, permissions: &[&str]) -> Self {
        Self {
            key: key.to_owned(),
            name: name.to_owned(),
            permissions: permissions.iter().map(|p| (*p).to_owned()).collect(),
        }
    }

    /// Whether this role grants a permission, either literally or via a
    /// `"*"` wildcard entry.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p == permission || p == "*")
    }
}

/// A user's role on a team. Owners are not membership rows, so their
/// role is synthesized rather than looked up.
#[derive(Debug, Clone, PartialEq)]
pub enum TeamRole {
    /// The team owner. Holds every permission implicitly.
    Owner,
    /// A registered role resolved from a membership row's key.
    Named(RoleDefinition),
}

impl TeamRole {
    pub fn key(&self) -> &str {
        match self {
            TeamRole::Owner => "owner",
            TeamRole::Named(def) => &def.key,
        }
    }
}

/// The set of roles an application supports.
///
/// An empty registry is valid and means the application does not use
/// role keys; role validation and role-key permission shorthand are
/// disabled in that case.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    roles: HashMap<String, RoleDefinition>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a role, replacing any previous definition for the key.
    pub fn register(&mut self, role: RoleDefinition) -> &mut Self {
        self.roles.insert(role.key.clone(), role);
        self
    }

    pub fn find_role(&self, key: &str) -> Option<&RoleDefinition> {
        self.roles.get(key)
    }

    /// Whether any roles are registered at all.
    pub fn has_roles(&self) -> bool {
        !self.roles.is_empty()
    }

    /// Loads a role catalog from a JSON array of definitions.
    pub fn from_json(json: &str) -> Result<Self, TeamError> {
        let roles: Vec<RoleDefinition> = serde_json::from_str(json)
            .map_err(|e| TeamError::Internal(format!("invalid role catalog: {e}")))?;

        let mut registry = Self::new();
        for role in roles {
            registry.register(role);
        }
        Ok(registry)
    }
}

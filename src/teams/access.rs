//! Role and permission resolution for a user on a team.

use std::sync::Arc;

use crate::teams::membership::MembershipService;
use crate::teams::roles::{RoleRegistry, TeamRole};
use crate::users::User;
use crate::TeamError;

/// Abilities carried by the credential a request authenticated with.
///
/// An API token restricts what the request may do regardless of the
/// user's standing on the team; a first-party session carries every
/// ability. The scope gate applies to owners too: a narrowly scoped
/// token never inherits the owner's blanket permissions.
#[derive(Debug, Clone)]
pub struct TokenScope {
    abilities: Vec<String>,
}

impl TokenScope {
    pub fn new(abilities: &[&str]) -> Self {
        Self {
            abilities: abilities.iter().map(|a| (*a).to_owned()).collect(),
        }
    }

    /// A scope granting every ability, as a first-party session does.
    pub fn full() -> Self {
        Self::new(&["*"])
    }

    pub fn allows(&self, permission: &str) -> bool {
        self.abilities
            .iter()
            .any(|a| a == permission || a == "*")
    }
}

/// Resolves a user's role and effective permissions on a team.
#[derive(Clone)]
pub struct AccessResolver {
    membership: MembershipService,
    registry: Arc<RoleRegistry>,
}

impl AccessResolver {
    pub fn new(membership: MembershipService, registry: Arc<RoleRegistry>) -> Self {
        Self {
            membership,
            registry,
        }
    }

    /// The user's role on the team: `Owner` for the owner, the
    /// registered definition for a membership row's key, `None` when the
    /// user is not on the team or the stored key is not registered.
    pub async fn role_of(&self, user: &User, team_id: i64) -> Result<Option<TeamRole>, TeamError> {
        if self.membership.owns_team(user.id, team_id).await? {
            return Ok(Some(TeamRole::Owner));
        }

        let membership = self
            .membership
            .memberships()
            .find_by_team_and_user(team_id, user.id)
            .await?;

        Ok(membership
            .and_then(|m| self.registry.find_role(&m.role).cloned())
            .map(TeamRole::Named))
    }

    /// The permission strings the user holds on the team. Owners hold
    /// the wildcard; members hold their role's list; non-members and
    /// members with unregistered role keys hold nothing.
    pub async fn permissions_of(
        &self,
        user: &User,
        team_id: i64,
    ) -> Result<Vec<String>, TeamError> {
        match self.role_of(user, team_id).await? {
            Some(TeamRole::Owner) => Ok(vec!["*".to_owned()]),
            Some(TeamRole::Named(def)) => Ok(def.permissions),
            None => Ok(Vec::new()),
        }
    }

    pub async fn has_role(
        &self,
        user: &User,
        team_id: i64,
        role_key: &str,
    ) -> Result<bool, TeamError> {
        Ok(self
            .role_of(user, team_id)
            .await?
            .is_some_and(|r| r.key() == role_key))
    }

    /// Whether the user may exercise `permission` on the team through
    /// the given credential scope.
    ///
    /// The scope gate runs before any standing check, so it constrains
    /// owners as much as members. When roles are registered, a
    /// permission string that is itself a role key is shorthand for
    /// holding that role.
    pub async fn has_permission(
        &self,
        user: &User,
        team_id: i64,
        permission: &str,
        scope: &TokenScope,
    ) -> Result<bool, TeamError> {
        if !self.membership.belongs_to_team(user.id, team_id).await? {
            return Ok(false);
        }

        if !scope.allows(permission) {
            return Ok(false);
        }

        match self.role_of(user, team_id).await? {
            Some(TeamRole::Owner) => Ok(true),
            Some(TeamRole::Named(def)) => {
                if def.has_permission(permission) {
                    return Ok(true);
                }
                // role-key shorthand, e.g. permission "editor"
                Ok(self.registry.has_roles() && def.key == permission)
            }
            None => Ok(false),
        }
    }
}

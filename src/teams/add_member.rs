//! Adding an existing user to a team on the owner's authority.

use std::sync::Arc;

use async_trait::async_trait;

use crate::teams::membership::MembershipService;
use crate::teams::roles::RoleRegistry;
use crate::teams::types::{Team, TeamMembership};
use crate::users::User;
use crate::validators::ValidationError;
use crate::TeamError;

/// Attaches a user to a team. Invitation acceptance funnels through this
/// seam so applications can layer their own checks (seat limits,
/// billing) on the attach path.
#[async_trait]
pub trait MemberAdder: Send + Sync {
    async fn add(
        &self,
        acting_owner: &User,
        team: &Team,
        email: &str,
        role: &str,
    ) -> Result<TeamMembership, TeamError>;
}

pub struct DirectMemberAdder {
    membership: MembershipService,
    registry: Arc<RoleRegistry>,
}

impl DirectMemberAdder {
    pub fn new(membership: MembershipService, registry: Arc<RoleRegistry>) -> Self {
        Self {
            membership,
            registry,
        }
    }
}

#[async_trait]
impl MemberAdder for DirectMemberAdder {
    /// Only the team owner may add members. The email must name an
    /// existing user, and when roles are registered the role key must be
    /// one of them.
    async fn add(
        &self,
        acting_owner: &User,
        team: &Team,
        email: &str,
        role: &str,
    ) -> Result<TeamMembership, TeamError> {
        if !team.is_owned_by(acting_owner.id) {
            return Err(TeamError::Forbidden);
        }

        let user = self
            .membership
            .users()
            .find_by_email(email)
            .await?
            .ok_or(TeamError::NotFound)?;

        if self.registry.has_roles() && self.registry.find_role(role).is_none() {
            return Err(TeamError::Validation(ValidationError::UnknownRole(
                role.to_owned(),
            )));
        }

        self.membership.attach(team.id, user.id, role).await
    }
}

//! Core membership queries and edge mutations.
//!
//! `MembershipService` is the shared substrate the higher-level services
//! build on: it answers who belongs where and moves individual edges,
//! but enforces no cross-entity invariants itself.

use std::sync::Arc;

use log::info;

use crate::teams::repository::{
    CreateMembership, TeamMembershipRepository, TeamRepository,
};
use crate::teams::types::{Team, TeamMembership};
use crate::users::{User, UserRepository};
use crate::validators::ValidationError;
use crate::TeamError;

#[derive(Clone)]
pub struct MembershipService {
    teams: Arc<dyn TeamRepository>,
    memberships: Arc<dyn TeamMembershipRepository>,
    users: Arc<dyn UserRepository>,
}

impl MembershipService {
    pub fn new(
        teams: Arc<dyn TeamRepository>,
        memberships: Arc<dyn TeamMembershipRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            teams,
            memberships,
            users,
        }
    }

    pub fn teams(&self) -> &Arc<dyn TeamRepository> {
        &self.teams
    }

    pub fn memberships(&self) -> &Arc<dyn TeamMembershipRepository> {
        &self.memberships
    }

    pub fn users(&self) -> &Arc<dyn UserRepository> {
        &self.users
    }

    pub async fn owns_team(&self, user_id: i64, team_id: i64) -> Result<bool, TeamError> {
        let team = self.teams.find_by_id(team_id).await?;
        Ok(team.is_some_and(|t| t.is_owned_by(user_id)))
    }

    /// Whether the user is on the team, as owner or as a member.
    pub async fn belongs_to_team(
        &self,
        user_id: i64,
        team_id: i64,
    ) -> Result<bool, TeamError> {
        if self.owns_team(user_id, team_id).await? {
            return Ok(true);
        }
        let membership = self
            .memberships
            .find_by_team_and_user(team_id, user_id)
            .await?;
        Ok(membership.is_some())
    }

    /// Every team the user is attached to: owned teams plus the current
    /// team when it is not one of them. Duplicates are collapsed by id.
    pub async fn all_teams(&self, user: &User) -> Result<Vec<Team>, TeamError> {
        let mut teams = self.teams.find_by_owner(user.id).await?;

        if let Some(current_id) = user.current_team_id {
            if !teams.iter().any(|t| t.id == current_id) {
                if let Some(current) = self.teams.find_by_id(current_id).await? {
                    teams.push(current);
                }
            }
        }

        Ok(teams)
    }

    /// The team the user's current pointer names, if any.
    pub async fn current_team(&self, user: &User) -> Result<Option<Team>, TeamError> {
        match user.current_team_id {
            Some(id) => self.teams.find_by_id(id).await,
            None => Ok(None),
        }
    }

    /// Points the user's current team at `team_id`, failing closed:
    /// returns `Ok(false)` and leaves the pointer untouched when the
    /// user does not belong to the team.
    pub async fn switch_current(&self, user_id: i64, team_id: i64) -> Result<bool, TeamError> {
        if !self.belongs_to_team(user_id, team_id).await? {
            info!(
                target: "cohort",
                "msg=\"switch refused, user not on team\", user_id={user_id}, team_id={team_id}"
            );
            return Ok(false);
        }

        self.users.set_current_team(user_id, Some(team_id)).await?;
        info!(target: "cohort", "msg=\"switched current team\", user_id={user_id}, team_id={team_id}");
        Ok(true)
    }

    /// Adds a membership edge, rejecting duplicates.
    pub async fn attach(
        &self,
        team_id: i64,
        user_id: i64,
        role: &str,
    ) -> Result<TeamMembership, TeamError> {
        let existing = self
            .memberships
            .find_by_team_and_user(team_id, user_id)
            .await?;
        if existing.is_some() {
            return Err(TeamError::Validation(ValidationError::AlreadyMember));
        }

        let membership = self
            .memberships
            .create(CreateMembership {
                team_id,
                user_id,
                role: role.to_owned(),
            })
            .await?;

        info!(
            target: "cohort",
            "msg=\"membership created\", team_id={team_id}, user_id={user_id}, role={role}"
        );

        Ok(membership)
    }

    /// Removes the membership edge if one exists. Returns whether a row
    /// was removed; ownership is untouched either way.
    pub async fn detach(&self, team_id: i64, user_id: i64) -> Result<bool, TeamError> {
        let removed = self
            .memberships
            .delete_by_team_and_user(team_id, user_id)
            .await?;

        if removed {
            info!(
                target: "cohort",
                "msg=\"membership removed\", team_id={team_id}, user_id={user_id}"
            );
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teams::mocks::{MockTeamMembershipRepository, MockTeamRepository};
    use crate::teams::repository::CreateTeam;
    use crate::users::{CreateUser, MockUserRepository};

    fn service() -> MembershipService {
        MembershipService::new(
            Arc::new(MockTeamRepository::new()),
            Arc::new(MockTeamMembershipRepository::new()),
            Arc::new(MockUserRepository::new()),
        )
    }

    async fn seed_user(svc: &MembershipService, email: &str) -> User {
        svc.users()
            .create(CreateUser {
                email: email.to_owned(),
                name: email.split('@').next().unwrap_or_default().to_owned(),
                hashed_password: "hash".to_owned(),
            })
            .await
            .unwrap()
    }

    async fn seed_team(svc: &MembershipService, owner_id: i64, name: &str) -> Team {
        svc.teams()
            .create(CreateTeam {
                name: name.to_owned(),
                owner_id,
                personal: false,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_ownership_and_belonging() {
        let svc = service();
        let owner = seed_user(&svc, "owner@example.com").await;
        let member = seed_user(&svc, "member@example.com").await;
        let team = seed_team(&svc, owner.id, "Crew").await;

        assert!(svc.owns_team(owner.id, team.id).await.unwrap());
        assert!(svc.belongs_to_team(owner.id, team.id).await.unwrap());
        assert!(!svc.belongs_to_team(member.id, team.id).await.unwrap());

        svc.attach(team.id, member.id, "editor").await.unwrap();
        assert!(svc.belongs_to_team(member.id, team.id).await.unwrap());
        assert!(!svc.owns_team(member.id, team.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_attach_rejects_duplicate() {
        let svc = service();
        let owner = seed_user(&svc, "owner@example.com").await;
        let member = seed_user(&svc, "member@example.com").await;
        let team = seed_team(&svc, owner.id, "Crew").await;

        svc.attach(team.id, member.id, "editor").await.unwrap();
        let result = svc.attach(team.id, member.id, "viewer").await;
        assert_eq!(
            result.unwrap_err(),
            TeamError::Validation(ValidationError::AlreadyMember)
        );
    }

    #[tokio::test]
    async fn test_all_teams_dedupes_current() {
        let svc = service();
        let owner = seed_user(&svc, "owner@example.com").await;
        let team = seed_team(&svc, owner.id, "Crew").await;

        // current points at an owned team: one entry, not two
        let owner = svc
            .users()
            .set_current_team(owner.id, Some(team.id))
            .await
            .unwrap();
        let teams = svc.all_teams(&owner).await.unwrap();
        assert_eq!(teams.len(), 1);

        // membership on someone else's team shows up via the pointer
        let other = seed_user(&svc, "other@example.com").await;
        let foreign = seed_team(&svc, other.id, "Foreign").await;
        svc.attach(foreign.id, owner.id, "editor").await.unwrap();
        let owner = svc
            .users()
            .set_current_team(owner.id, Some(foreign.id))
            .await
            .unwrap();

        let teams = svc.all_teams(&owner).await.unwrap();
        assert_eq!(teams.len(), 2);
    }

    #[tokio::test]
    async fn test_switch_fails_closed() {
        let svc = service();
        let owner = seed_user(&svc, "owner@example.com").await;
        let stranger = seed_user(&svc, "stranger@example.com").await;
        let team = seed_team(&svc, owner.id, "Crew").await;

        assert!(!svc.switch_current(stranger.id, team.id).await.unwrap());
        let stranger = svc.users().find_by_id(stranger.id).await.unwrap().unwrap();
        assert!(stranger.current_team_id.is_none());

        assert!(svc.switch_current(owner.id, team.id).await.unwrap());
        let owner = svc.users().find_by_id(owner.id).await.unwrap().unwrap();
        assert_eq!(owner.current_team_id, Some(team.id));
    }

    #[tokio::test]
    async fn test_detach_reports_removal() {
        let svc = service();
        let owner = seed_user(&svc, "owner@example.com").await;
        let member = seed_user(&svc, "member@example.com").await;
        let team = seed_team(&svc, owner.id, "Crew").await;

        svc.attach(team.id, member.id, "editor").await.unwrap();
        assert!(svc.detach(team.id, member.id).await.unwrap());
        assert!(!svc.detach(team.id, member.id).await.unwrap());
    }
}

//! Team creation and the self-healing single-team invariant.
//!
//! Every user with an account ends up with at least one team and a
//! current-team pointer that names a team they belong to. The lifecycle
//! service owns both sides of that promise: explicit creation paths and
//! the repair path that restores the invariant after removals or
//! historical drift.

use std::sync::Arc;

use log::info;

use crate::events::{dispatch, TeamEvent};
use crate::teams::membership::MembershipService;
use crate::teams::repository::{CreateTeam, TransactionManager};
use crate::teams::types::Team;
use crate::users::User;
use crate::validators::{validate_team_name, ValidationError};
use crate::TeamError;

pub struct TeamLifecycle<X> {
    membership: MembershipService,
    tx: Arc<X>,
}

impl<X> Clone for TeamLifecycle<X> {
    fn clone(&self) -> Self {
        Self {
            membership: self.membership.clone(),
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<X: TransactionManager> TeamLifecycle<X> {
    pub fn new(membership: MembershipService, tx: Arc<X>) -> Self {
        Self { membership, tx }
    }

    pub fn membership(&self) -> &MembershipService {
        &self.membership
    }

    /// Creates the user's personal team and points them at it.
    ///
    /// Runs without its own transaction so registration can fold it into
    /// one. The owner gets no membership row; ownership is the column.
    pub(crate) async fn create_personal_team(
        &self,
        user: &User,
        name: &str,
    ) -> Result<Team, TeamError> {
        let team = self
            .membership
            .teams()
            .create(CreateTeam {
                name: name.trim().to_owned(),
                owner_id: user.id,
                personal: true,
            })
            .await?;

        self.membership
            .users()
            .set_current_team(user.id, Some(team.id))
            .await?;

        info!(
            target: "cohort",
            "msg=\"personal team created\", team_id={}, owner_id={}", team.id, user.id
        );
        dispatch(&TeamEvent::team_created(team.id, user.id, true)).await;

        Ok(team)
    }

    /// Creates a team for a user who has none yet and makes it current.
    ///
    /// A user who already owns or belongs to any team is refused; one
    /// active team per user.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "create_owned_team", skip_all, err)
    )]
    pub async fn create_owned_team(&self, user_id: i64, name: &str) -> Result<Team, TeamError> {
        validate_team_name(name)?;
        let name = name.trim().to_owned();

        let membership = self.membership.clone();
        self.tx
            .run(|| async move {
                let user = membership
                    .users()
                    .find_by_id(user_id)
                    .await?
                    .ok_or(TeamError::NotFound)?;

                if !membership.all_teams(&user).await?.is_empty() {
                    return Err(TeamError::Validation(ValidationError::AlreadyHasTeam));
                }

                let team = membership
                    .teams()
                    .create(CreateTeam {
                        name,
                        owner_id: user.id,
                        personal: false,
                    })
                    .await?;
                membership.attach(team.id, user.id, "owner").await?;
                membership
                    .users()
                    .set_current_team(user.id, Some(team.id))
                    .await?;

                info!(
                    target: "cohort",
                    "msg=\"team created\", team_id={}, owner_id={}", team.id, user.id
                );
                dispatch(&TeamEvent::team_created(team.id, user.id, false)).await;

                Ok(team)
            })
            .await
    }

    /// Restores the invariant for a user: at least one team, and a
    /// current pointer naming a team they belong to. No-op when the user
    /// is already healthy.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "ensure_has_team", skip_all, err)
    )]
    pub async fn ensure_has_team(&self, user_id: i64) -> Result<User, TeamError> {
        self.tx.run(|| self.heal(user_id)).await
    }

    /// Removes a user's membership on a team, then repairs their team
    /// state. Ownership edges are never removed here; removing an owner
    /// from their own team is a no-op on the ownership side.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "remove_from_team", skip_all, err)
    )]
    pub async fn remove_from_team(&self, user_id: i64, team_id: i64) -> Result<(), TeamError> {
        self.tx
            .run(|| async move {
                let removed = self.membership.detach(team_id, user_id).await?;

                if removed {
                    let user = self
                        .membership
                        .users()
                        .find_by_id(user_id)
                        .await?
                        .ok_or(TeamError::NotFound)?;
                    if user.current_team_id == Some(team_id) {
                        self.membership
                            .users()
                            .set_current_team(user_id, None)
                            .await?;
                    }
                    dispatch(&TeamEvent::member_removed(team_id, user_id)).await;
                }

                self.heal(user_id).await?;
                Ok(())
            })
            .await
    }

    /// The repair step, transaction-free so callers can compose it.
    ///
    /// A user with no teams gets a fresh personal team, this time with a
    /// membership row as well, so a later detach from it still leaves
    /// the ownership edge behind. A user whose pointer is null or names
    /// a team they no longer belong to is repointed, preferring their
    /// personal team, then any owned team, then any remaining team.
    pub(crate) async fn heal(&self, user_id: i64) -> Result<User, TeamError> {
        let user = self
            .membership
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or(TeamError::NotFound)?;

        let teams = self.membership.all_teams(&user).await?;

        if teams.is_empty() {
            let team = self
                .membership
                .teams()
                .create(CreateTeam {
                    name: format!("{}'s Team", user.name),
                    owner_id: user.id,
                    personal: true,
                })
                .await?;
            self.membership.attach(team.id, user.id, "owner").await?;
            let user = self
                .membership
                .users()
                .set_current_team(user.id, Some(team.id))
                .await?;

            info!(
                target: "cohort",
                "msg=\"healed teamless user\", user_id={user_id}, team_id={}", team.id
            );
            dispatch(&TeamEvent::team_created(team.id, user.id, true)).await;

            return Ok(user);
        }

        if let Some(current_id) = user.current_team_id {
            if teams.iter().any(|t| t.id == current_id) {
                return Ok(user);
            }
        }

        let target = teams
            .iter()
            .find(|t| t.personal && t.is_owned_by(user.id))
            .or_else(|| teams.iter().find(|t| t.is_owned_by(user.id)))
            .unwrap_or(&teams[0]);

        let user = self
            .membership
            .users()
            .set_current_team(user.id, Some(target.id))
            .await?;
        info!(
            target: "cohort",
            "msg=\"repointed current team\", user_id={user_id}, team_id={}", target.id
        );

        Ok(user)
    }
}

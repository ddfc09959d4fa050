//! User registration, with or without an invitation in hand.
//!
//! A plain registration names a team and gets it as a personal team. An
//! invited registration skips team naming: the account lands directly on
//! the inviting team. Either way the flow ends with the user on exactly
//! one current team, a stale invitation notwithstanding.

use std::sync::Arc;

use log::{info, warn};

use crate::config::CohortConfig;
use crate::crypto::PasswordHasher;
use crate::events::{dispatch, TeamEvent};
use crate::secret::SecretString;
use crate::teams::invitations::InvitationService;
use crate::teams::lifecycle::TeamLifecycle;
use crate::teams::repository::TransactionManager;
use crate::users::{CreateUser, User, UserRepository};
use crate::validators::{validate_email, validate_team_name, ValidationError};
use crate::TeamError;

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: SecretString,
    /// Required when registering without an invitation; ignored with one.
    pub team_name: Option<String>,
    pub invitation_id: Option<i64>,
    pub terms_accepted: bool,
}

pub struct RegisterAction<X> {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    lifecycle: TeamLifecycle<X>,
    invitations: InvitationService<X>,
    config: CohortConfig,
    tx: Arc<X>,
}

impl<X: TransactionManager> RegisterAction<X> {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        lifecycle: TeamLifecycle<X>,
        invitations: InvitationService<X>,
        config: CohortConfig,
        tx: Arc<X>,
    ) -> Self {
        Self {
            users,
            hasher,
            lifecycle,
            invitations,
            config,
            tx,
        }
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(name = "register", skip_all, err))]
    pub async fn execute(&self, input: RegisterInput) -> Result<User, TeamError> {
        self.validate(&input).await?;

        // hashing is slow by construction; keep it out of the transaction
        let hashed_password = self.hasher.hash(input.password.expose_secret())?;
        let name = input
            .email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_owned();

        let email = input.email.clone();
        let team_name = input.team_name.clone();
        let invitation_id = input.invitation_id;

        let user = self
            .tx
            .run(|| async move {
                let user = self
                    .users
                    .create(CreateUser {
                        email,
                        name,
                        hashed_password,
                    })
                    .await?;

                match invitation_id {
                    Some(invitation_id) => {
                        // a stale or mismatched invitation does not sink the
                        // registration; the heal below gives the user a team
                        match self
                            .invitations
                            .apply_transfer(user.id, invitation_id)
                            .await
                        {
                            Ok(_) => {}
                            Err(TeamError::NotFound | TeamError::Forbidden) => {
                                warn!(
                                    target: "cohort",
                                    "msg=\"invitation unusable at registration\", \
                                     invitation_id={invitation_id}, user_id={}", user.id
                                );
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    None => {
                        // validated present when there is no invitation
                        let team_name = team_name
                            .ok_or(TeamError::Validation(ValidationError::TeamNameMissing))?;
                        self.lifecycle.create_personal_team(&user, &team_name).await?;
                    }
                }

                self.lifecycle.heal(user.id).await
            })
            .await?;

        info!(
            target: "cohort",
            "msg=\"user registered\", user_id={}, via_invitation={}",
            user.id,
            input.invitation_id.is_some()
        );
        dispatch(&TeamEvent::user_registered(
            user.id,
            input.invitation_id.is_some(),
        ))
        .await;

        Ok(user)
    }

    async fn validate(&self, input: &RegisterInput) -> Result<(), TeamError> {
        validate_email(&input.email)?;

        if self.users.email_exists(&input.email).await? {
            return Err(TeamError::Validation(ValidationError::EmailTaken));
        }

        self.config
            .password_policy
            .validate(input.password.expose_secret())?;

        if self.config.require_terms && !input.terms_accepted {
            return Err(TeamError::Validation(ValidationError::TermsNotAccepted));
        }

        if input.invitation_id.is_none() {
            match &input.team_name {
                Some(name) => validate_team_name(name)?,
                None => {
                    return Err(TeamError::Validation(ValidationError::TeamNameMissing));
                }
            }
        }

        Ok(())
    }
}

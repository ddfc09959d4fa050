//! Invitation issuance and resolution.
//!
//! An invitation is addressed to an email, not a user, so it can be sent
//! before the invitee registers. Resolving one is destructive: accept
//! moves the user onto the team and deletes the row, decline just
//! deletes it. The delete doubles as the commit point when two
//! resolutions race; the loser reads a missing row and gets `NotFound`.

use std::sync::Arc;

use log::{info, warn};

use crate::events::{dispatch, TeamEvent};
use crate::notify::TeamNotifier;
use crate::teams::add_member::MemberAdder;
use crate::teams::membership::MembershipService;
use crate::teams::repository::{CreateInvitation, TeamInvitationRepository, TransactionManager};
use crate::teams::roles::RoleRegistry;
use crate::teams::types::{Team, TeamInvitation};
use crate::users::User;
use crate::validators::{validate_email, ValidationError};
use crate::TeamError;

/// Where an invitation link should send its visitor, based on who is
/// looking at it. Computed without touching the invitation.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityResolution {
    /// Nobody is signed in. `account_exists` distinguishes the login
    /// redirect from the registration redirect.
    Unauthenticated { account_exists: bool },
    /// Someone is signed in, but not as the invited address.
    MismatchedEmail,
    /// The signed-in user is the invitee and may resolve the invitation.
    Authorized,
}

#[derive(Debug, Clone)]
pub struct InviteInput {
    pub team_id: i64,
    pub email: String,
    pub role: String,
}

pub struct InvitationService<X> {
    invitations: Arc<dyn TeamInvitationRepository>,
    membership: MembershipService,
    adder: Arc<dyn MemberAdder>,
    notifier: Arc<dyn TeamNotifier>,
    registry: Arc<RoleRegistry>,
    tx: Arc<X>,
}

impl<X> Clone for InvitationService<X> {
    fn clone(&self) -> Self {
        Self {
            invitations: Arc::clone(&self.invitations),
            membership: self.membership.clone(),
            adder: Arc::clone(&self.adder),
            notifier: Arc::clone(&self.notifier),
            registry: Arc::clone(&self.registry),
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<X: TransactionManager> InvitationService<X> {
    pub fn new(
        invitations: Arc<dyn TeamInvitationRepository>,
        membership: MembershipService,
        adder: Arc<dyn MemberAdder>,
        notifier: Arc<dyn TeamNotifier>,
        registry: Arc<RoleRegistry>,
        tx: Arc<X>,
    ) -> Self {
        Self {
            invitations,
            membership,
            adder,
            notifier,
            registry,
            tx,
        }
    }

    pub async fn find(&self, id: i64) -> Result<Option<TeamInvitation>, TeamError> {
        self.invitations.find_by_id(id).await
    }

    /// Issues an invitation on the team owner's authority and notifies
    /// the address. Notification failure is logged and swallowed; the
    /// invitation stands either way.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "invite", skip_all, err))]
    pub async fn invite(
        &self,
        acting: &User,
        input: InviteInput,
    ) -> Result<TeamInvitation, TeamError> {
        validate_email(&input.email)?;

        let team = self
            .membership
            .teams()
            .find_by_id(input.team_id)
            .await?
            .ok_or(TeamError::NotFound)?;

        if !team.is_owned_by(acting.id) {
            return Err(TeamError::Forbidden);
        }

        if self.registry.has_roles() && self.registry.find_role(&input.role).is_none() {
            return Err(TeamError::Validation(ValidationError::UnknownRole(
                input.role.clone(),
            )));
        }

        let invitee = self.membership.users().find_by_email(&input.email).await?;
        if let Some(ref invitee) = invitee {
            if self.membership.belongs_to_team(invitee.id, team.id).await? {
                return Err(TeamError::Validation(ValidationError::AlreadyMember));
            }
        }

        // one pending invitation per (team, email); the store is a plain
        // insert, so the rule lives here
        let pending = self.invitations.find_pending_by_email(&input.email).await?;
        if pending.iter().any(|i| i.team_id == team.id) {
            return Err(TeamError::Validation(ValidationError::AlreadyInvited));
        }

        let invitation = self
            .invitations
            .create(CreateInvitation {
                team_id: team.id,
                email: input.email,
                role: input.role,
            })
            .await?;

        info!(
            target: "cohort",
            "msg=\"invitation created\", invitation_id={}, team_id={}, role={}",
            invitation.id, team.id, invitation.role
        );

        self.notify(&invitation, &team, invitee.as_ref()).await;
        dispatch(&TeamEvent::invitation_sent(invitation.id, team.id)).await;

        Ok(invitation)
    }

    async fn notify(&self, invitation: &TeamInvitation, team: &Team, invitee: Option<&User>) {
        let result = match invitee {
            Some(user) => {
                let current = match self.membership.current_team(user).await {
                    Ok(current) => current,
                    Err(e) => {
                        warn!(
                            target: "cohort",
                            "msg=\"current team lookup failed for notification\", \
                             invitation_id={}, error=\"{e}\"", invitation.id
                        );
                        None
                    }
                };
                self.notifier
                    .send_existing_user_invitation(invitation, team, current.as_ref())
                    .await
            }
            None => self.notifier.send_invitation(invitation, team).await,
        };

        if let Err(e) = result {
            warn!(
                target: "cohort",
                "msg=\"invitation notification failed\", invitation_id={}, error=\"{e}\"",
                invitation.id
            );
        }
    }

    /// Decides where an invitation link should route its visitor. Reads
    /// only; the invitation is untouched whoever looks at it.
    pub async fn resolve_identity(
        &self,
        viewer: Option<&User>,
        invitation_id: i64,
    ) -> Result<IdentityResolution, TeamError> {
        let invitation = self
            .invitations
            .find_by_id(invitation_id)
            .await?
            .ok_or(TeamError::NotFound)?;

        match viewer {
            None => {
                let account_exists =
                    self.membership.users().email_exists(&invitation.email).await?;
                Ok(IdentityResolution::Unauthenticated { account_exists })
            }
            Some(user) if user.email != invitation.email => {
                Ok(IdentityResolution::MismatchedEmail)
            }
            Some(_) => Ok(IdentityResolution::Authorized),
        }
    }

    /// Accepts an invitation: the user leaves every team they are a
    /// member of, joins the inviting team in the invited role, and the
    /// invitation is deleted. All or nothing.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "accept_invitation", skip_all, err))]
    pub async fn accept(&self, user: &User, invitation_id: i64) -> Result<Team, TeamError> {
        let invitation = self
            .invitations
            .find_by_id(invitation_id)
            .await?
            .ok_or(TeamError::NotFound)?;
        if invitation.email != user.email {
            return Err(TeamError::Forbidden);
        }

        let user_id = user.id;
        self.tx
            .run(|| self.apply_transfer(user_id, invitation_id))
            .await
    }

    /// Tolerant acceptance for the post-login path: an invitation that
    /// disappeared or no longer matches the session's email is dropped
    /// silently instead of failing the login.
    pub async fn accept_after_login(
        &self,
        user: &User,
        invitation_id: i64,
    ) -> Result<Option<Team>, TeamError> {
        match self.accept(user, invitation_id).await {
            Ok(team) => Ok(Some(team)),
            Err(TeamError::NotFound | TeamError::Forbidden) => {
                info!(
                    target: "cohort",
                    "msg=\"stale invitation dropped after login\", \
                     invitation_id={invitation_id}, user_id={}", user.id
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Declines an invitation addressed to the user; it is deleted and
    /// cannot be revived.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "decline_invitation", skip_all, err))]
    pub async fn decline(&self, user: &User, invitation_id: i64) -> Result<(), TeamError> {
        let email = user.email.clone();
        self.tx
            .run(|| async move {
                let invitation = self
                    .invitations
                    .find_by_id(invitation_id)
                    .await?
                    .ok_or(TeamError::NotFound)?;
                if invitation.email != email {
                    return Err(TeamError::Forbidden);
                }

                self.invitations.delete(invitation.id).await?;
                info!(
                    target: "cohort",
                    "msg=\"invitation declined\", invitation_id={invitation_id}"
                );
                dispatch(&TeamEvent::invitation_declined(invitation_id)).await;

                Ok(())
            })
            .await
    }

    /// The transfer itself, transaction-free so registration can fold it
    /// into its own transaction. Everything is re-read here: when two
    /// resolutions race, the loser finds the invitation gone.
    ///
    /// The attach runs before anything is severed: it is the one write
    /// that can be refused, and the later writes cannot be undone, so a
    /// refusal must leave the user's memberships exactly as they were.
    pub(crate) async fn apply_transfer(
        &self,
        user_id: i64,
        invitation_id: i64,
    ) -> Result<Team, TeamError> {
        let invitation = self
            .invitations
            .find_by_id(invitation_id)
            .await?
            .ok_or(TeamError::NotFound)?;
        let user = self
            .membership
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or(TeamError::NotFound)?;
        if invitation.email != user.email {
            return Err(TeamError::Forbidden);
        }

        let team = self
            .membership
            .teams()
            .find_by_id(invitation.team_id)
            .await?
            .ok_or(TeamError::NotFound)?;
        let owner = self
            .membership
            .users()
            .find_by_id(team.owner_id)
            .await?
            .ok_or_else(|| TeamError::Internal("team owner missing".into()))?;

        let old_teams = self.membership.all_teams(&user).await?;

        self.adder.add(&owner, &team, &user.email, &invitation.role).await?;

        // sever membership everywhere else; ownership edges stay behind
        for old in old_teams.iter().filter(|t| t.id != team.id) {
            self.membership.detach(old.id, user.id).await?;
        }

        if !self.membership.switch_current(user.id, team.id).await? {
            return Err(TeamError::Internal(
                "freshly added member cannot switch to team".into(),
            ));
        }

        // commit point: a racing resolution already deleted it
        self.invitations.delete(invitation.id).await?;

        info!(
            target: "cohort",
            "msg=\"invitation accepted\", invitation_id={}, team_id={}, user_id={}",
            invitation.id, team.id, user.id
        );
        dispatch(&TeamEvent::invitation_accepted(invitation.id, team.id, user.id)).await;

        Ok(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{RecordedNotification, RecordingNotifier};
    use crate::teams::add_member::DirectMemberAdder;
    use crate::teams::mocks::{
        MockTeamInvitationRepository, MockTeamMembershipRepository, MockTeamRepository,
        MockTransactionManager,
    };
    use crate::teams::repository::CreateTeam;
    use crate::teams::roles::RoleDefinition;
    use crate::users::{CreateUser, MockUserRepository};

    struct Fixture {
        service: InvitationService<MockTransactionManager>,
        membership: MembershipService,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture() -> Fixture {
        let membership = MembershipService::new(
            Arc::new(MockTeamRepository::new()),
            Arc::new(MockTeamMembershipRepository::new()),
            Arc::new(MockUserRepository::new()),
        );

        let mut registry = RoleRegistry::new();
        registry.register(RoleDefinition::new("editor", "Editor", &["read", "update"]));
        let registry = Arc::new(registry);

        let notifier = Arc::new(RecordingNotifier::new());
        let adder = Arc::new(DirectMemberAdder::new(
            membership.clone(),
            Arc::clone(&registry),
        ));

        let service = InvitationService::new(
            Arc::new(MockTeamInvitationRepository::new()),
            membership.clone(),
            adder,
            Arc::clone(&notifier) as Arc<dyn TeamNotifier>,
            registry,
            Arc::new(MockTransactionManager::new()),
        );

        Fixture {
            service,
            membership,
            notifier,
        }
    }

    async fn seed_user(membership: &MembershipService, email: &str) -> User {
        membership
            .users()
            .create(CreateUser {
                email: email.to_owned(),
                name: email.split('@').next().unwrap_or_default().to_owned(),
                hashed_password: "hash".to_owned(),
            })
            .await
            .unwrap()
    }

    async fn seed_team(membership: &MembershipService, owner_id: i64) -> Team {
        membership
            .teams()
            .create(CreateTeam {
                name: "Crew".to_owned(),
                owner_id,
                personal: false,
            })
            .await
            .unwrap()
    }

    fn invite_input(team_id: i64, email: &str) -> InviteInput {
        InviteInput {
            team_id,
            email: email.to_owned(),
            role: "editor".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_invite_notifies_new_address() {
        let f = fixture();
        let owner = seed_user(&f.membership, "owner@example.com").await;
        let team = seed_team(&f.membership, owner.id).await;

        let invitation = f
            .service
            .invite(&owner, invite_input(team.id, "new@example.com"))
            .await
            .unwrap();

        assert_eq!(
            f.notifier.sent(),
            vec![RecordedNotification::NewAccount {
                invitation_id: invitation.id,
                email: "new@example.com".to_owned(),
            }]
        );
    }

    #[tokio::test]
    async fn test_invite_notifies_existing_user_with_their_team() {
        let f = fixture();
        let owner = seed_user(&f.membership, "owner@example.com").await;
        let team = seed_team(&f.membership, owner.id).await;

        let invitee = seed_user(&f.membership, "busy@example.com").await;
        let their_team = seed_team(&f.membership, invitee.id).await;
        f.membership
            .users()
            .set_current_team(invitee.id, Some(their_team.id))
            .await
            .unwrap();

        let invitation = f
            .service
            .invite(&owner, invite_input(team.id, "busy@example.com"))
            .await
            .unwrap();

        assert_eq!(
            f.notifier.sent(),
            vec![RecordedNotification::ExistingUser {
                invitation_id: invitation.id,
                email: "busy@example.com".to_owned(),
                current_team_id: Some(their_team.id),
            }]
        );
    }

    #[tokio::test]
    async fn test_invite_validations() {
        let f = fixture();
        let owner = seed_user(&f.membership, "owner@example.com").await;
        let outsider = seed_user(&f.membership, "outsider@example.com").await;
        let team = seed_team(&f.membership, owner.id).await;

        assert_eq!(
            f.service
                .invite(&owner, invite_input(team.id, "not-an-email"))
                .await
                .unwrap_err(),
            TeamError::Validation(ValidationError::EmailInvalidFormat)
        );
        assert_eq!(
            f.service
                .invite(&owner, invite_input(999, "new@example.com"))
                .await
                .unwrap_err(),
            TeamError::NotFound
        );
        assert_eq!(
            f.service
                .invite(&outsider, invite_input(team.id, "new@example.com"))
                .await
                .unwrap_err(),
            TeamError::Forbidden
        );

        let bad_role = InviteInput {
            team_id: team.id,
            email: "new@example.com".to_owned(),
            role: "sorcerer".to_owned(),
        };
        assert_eq!(
            f.service.invite(&owner, bad_role).await.unwrap_err(),
            TeamError::Validation(ValidationError::UnknownRole("sorcerer".to_owned()))
        );

        // owner already belongs through the ownership column
        assert_eq!(
            f.service
                .invite(&owner, invite_input(team.id, "owner@example.com"))
                .await
                .unwrap_err(),
            TeamError::Validation(ValidationError::AlreadyMember)
        );

        // duplicate pending invitation
        f.service
            .invite(&owner, invite_input(team.id, "new@example.com"))
            .await
            .unwrap();
        assert_eq!(
            f.service
                .invite(&owner, invite_input(team.id, "new@example.com"))
                .await
                .unwrap_err(),
            TeamError::Validation(ValidationError::AlreadyInvited)
        );
    }

    #[tokio::test]
    async fn test_resolve_identity_branches() {
        let f = fixture();
        let owner = seed_user(&f.membership, "owner@example.com").await;
        let team = seed_team(&f.membership, owner.id).await;
        let invitation = f
            .service
            .invite(&owner, invite_input(team.id, "new@example.com"))
            .await
            .unwrap();

        // unauthenticated, no account yet
        assert_eq!(
            f.service.resolve_identity(None, invitation.id).await.unwrap(),
            IdentityResolution::Unauthenticated {
                account_exists: false
            }
        );

        // unauthenticated, account exists
        let invitee = seed_user(&f.membership, "new@example.com").await;
        assert_eq!(
            f.service.resolve_identity(None, invitation.id).await.unwrap(),
            IdentityResolution::Unauthenticated {
                account_exists: true
            }
        );

        // wrong session
        assert_eq!(
            f.service
                .resolve_identity(Some(&owner), invitation.id)
                .await
                .unwrap(),
            IdentityResolution::MismatchedEmail
        );

        // the invitee
        assert_eq!(
            f.service
                .resolve_identity(Some(&invitee), invitation.id)
                .await
                .unwrap(),
            IdentityResolution::Authorized
        );

        // resolution reads only
        assert!(f.service.find(invitation.id).await.unwrap().is_some());

        assert_eq!(
            f.service.resolve_identity(None, 999).await.unwrap_err(),
            TeamError::NotFound
        );
    }

    #[tokio::test]
    async fn test_decline_deletes_only_for_invitee() {
        let f = fixture();
        let owner = seed_user(&f.membership, "owner@example.com").await;
        let team = seed_team(&f.membership, owner.id).await;
        let invitation = f
            .service
            .invite(&owner, invite_input(team.id, "new@example.com"))
            .await
            .unwrap();
        let invitee = seed_user(&f.membership, "new@example.com").await;

        assert_eq!(
            f.service.decline(&owner, invitation.id).await.unwrap_err(),
            TeamError::Forbidden
        );
        assert!(f.service.find(invitation.id).await.unwrap().is_some());

        f.service.decline(&invitee, invitation.id).await.unwrap();
        assert!(f.service.find(invitation.id).await.unwrap().is_none());
        assert_eq!(
            f.service.decline(&invitee, invitation.id).await.unwrap_err(),
            TeamError::NotFound
        );
    }

    #[tokio::test]
    async fn test_accept_requires_matching_email() {
        let f = fixture();
        let owner = seed_user(&f.membership, "owner@example.com").await;
        let team = seed_team(&f.membership, owner.id).await;
        let invitation = f
            .service
            .invite(&owner, invite_input(team.id, "new@example.com"))
            .await
            .unwrap();
        let impostor = seed_user(&f.membership, "impostor@example.com").await;

        assert_eq!(
            f.service.accept(&impostor, invitation.id).await.unwrap_err(),
            TeamError::Forbidden
        );
        assert!(f.service.find(invitation.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_refused_transfer_changes_nothing() {
        let f = fixture();
        let boss = seed_user(&f.membership, "boss@example.com").await;
        let home_team = seed_team(&f.membership, boss.id).await;
        let chief = seed_user(&f.membership, "chief@example.com").await;
        let target_team = seed_team(&f.membership, chief.id).await;

        let dev = seed_user(&f.membership, "dev@example.com").await;
        f.membership
            .attach(home_team.id, dev.id, "editor")
            .await
            .unwrap();
        f.membership
            .users()
            .set_current_team(dev.id, Some(home_team.id))
            .await
            .unwrap();

        let invitation = f
            .service
            .invite(&chief, invite_input(target_team.id, "dev@example.com"))
            .await
            .unwrap();

        // a membership row on the target team appears after the
        // invitation went out, so the attach inside accept is refused
        f.membership
            .attach(target_team.id, dev.id, "viewer")
            .await
            .unwrap();

        assert_eq!(
            f.service.accept(&dev, invitation.id).await.unwrap_err(),
            TeamError::Validation(ValidationError::AlreadyMember)
        );

        // the refusal left everything exactly as it was
        assert!(f
            .membership
            .belongs_to_team(dev.id, home_team.id)
            .await
            .unwrap());
        let dev = f
            .membership
            .users()
            .find_by_id(dev.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dev.current_team_id, Some(home_team.id));
        assert!(f.service.find(invitation.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_accept_after_login_tolerates_stale() {
        let f = fixture();
        let user = seed_user(&f.membership, "user@example.com").await;

        assert_eq!(
            f.service.accept_after_login(&user, 999).await.unwrap(),
            None
        );
    }
}

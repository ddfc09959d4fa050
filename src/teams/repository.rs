//! Persistence seams for teams, memberships and invitations.
//!
//! Services depend on these traits through `Arc<dyn ...>` so tests can
//! swap in the in-memory mocks and applications can bind any store.

use std::future::Future;

use async_trait::async_trait;

use crate::teams::types::{Team, TeamInvitation, TeamMembership};
use crate::TeamError;

#[derive(Debug, Clone)]
pub struct CreateTeam {
    pub name: String,
    pub owner_id: i64,
    pub personal: bool,
}

#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub team_id: i64,
    pub user_id: i64,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct CreateInvitation {
    pub team_id: i64,
    pub email: String,
    pub role: String,
}

#[async_trait]
pub trait TeamRepository: Send + Sync {
    async fn create(&self, data: CreateTeam) -> Result<Team, TeamError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Team>, TeamError>;
    async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Team>, TeamError>;
}

#[async_trait]
pub trait TeamMembershipRepository: Send + Sync {
    async fn create(&self, data: CreateMembership) -> Result<TeamMembership, TeamError>;
    async fn find_by_team_and_user(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<TeamMembership>, TeamError>;
    async fn find_by_team(&self, team_id: i64) -> Result<Vec<TeamMembership>, TeamError>;
    /// Returns whether a row was actually removed.
    async fn delete_by_team_and_user(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<bool, TeamError>;
}

#[async_trait]
pub trait TeamInvitationRepository: Send + Sync {
    async fn create(&self, data: CreateInvitation) -> Result<TeamInvitation, TeamError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<TeamInvitation>, TeamError>;
    async fn find_pending_by_email(&self, email: &str)
        -> Result<Vec<TeamInvitation>, TeamError>;
    /// Deletes an invitation, failing with `NotFound` if it is already
    /// gone. Acceptance relies on this as its commit point when two
    /// resolutions race.
    async fn delete(&self, id: i64) -> Result<(), TeamError>;
}

/// Runs a closure with transactional semantics: either every store write
/// inside `op` lands or none do, and concurrent transactions do not
/// interleave.
///
/// The method is generic, so services are generic over their manager
/// rather than holding a trait object.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn run<T, F, Fut>(&self, op: F) -> Result<T, TeamError>
    where
        T: Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, TeamError>> + Send;
}

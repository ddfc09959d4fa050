//! In-memory repository implementations for tests and prototyping.
//!
//! The mocks keep rows in `RwLock<HashMap>`s with atomic id counters. The
//! membership store enforces the `(team_id, user_id)` unique constraint a
//! relational schema would carry; the other stores are plain inserts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::teams::repository::{
    CreateInvitation, CreateMembership, CreateTeam, TeamInvitationRepository,
    TeamMembershipRepository, TeamRepository, TransactionManager,
};
use crate::teams::types::{Team, TeamInvitation, TeamMembership};
use crate::validators::ValidationError;
use crate::TeamError;

pub struct MockTeamRepository {
    teams: RwLock<HashMap<i64, Team>>,
    next_id: AtomicI64,
}

impl MockTeamRepository {
    pub fn new() -> Self {
        Self {
            teams: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MockTeamRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TeamRepository for MockTeamRepository {
    async fn create(&self, data: CreateTeam) -> Result<Team, TeamError> {
        let mut teams = self
            .teams
            .write()
            .map_err(|_| TeamError::Internal("lock poisoned".into()))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let team = Team {
            id,
            name: data.name,
            owner_id: data.owner_id,
            personal: data.personal,
            created_at: now,
            updated_at: now,
        };
        teams.insert(id, team.clone());

        Ok(team)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Team>, TeamError> {
        let teams = self
            .teams
            .read()
            .map_err(|_| TeamError::Internal("lock poisoned".into()))?;
        Ok(teams.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Team>, TeamError> {
        let teams = self
            .teams
            .read()
            .map_err(|_| TeamError::Internal("lock poisoned".into()))?;

        let mut owned: Vec<Team> = teams
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by_key(|t| t.id);

        Ok(owned)
    }
}

pub struct MockTeamMembershipRepository {
    memberships: RwLock<HashMap<i64, TeamMembership>>,
    next_id: AtomicI64,
}

impl MockTeamMembershipRepository {
    pub fn new() -> Self {
        Self {
            memberships: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MockTeamMembershipRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TeamMembershipRepository for MockTeamMembershipRepository {
    async fn create(&self, data: CreateMembership) -> Result<TeamMembership, TeamError> {
        let mut memberships = self
            .memberships
            .write()
            .map_err(|_| TeamError::Internal("lock poisoned".into()))?;

        // (team_id, user_id) is unique
        if memberships
            .values()
            .any(|m| m.team_id == data.team_id && m.user_id == data.user_id)
        {
            return Err(TeamError::Validation(ValidationError::AlreadyMember));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let membership = TeamMembership {
            id,
            team_id: data.team_id,
            user_id: data.user_id,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        memberships.insert(id, membership.clone());

        Ok(membership)
    }

    async fn find_by_team_and_user(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<TeamMembership>, TeamError> {
        let memberships = self
            .memberships
            .read()
            .map_err(|_| TeamError::Internal("lock poisoned".into()))?;
        Ok(memberships
            .values()
            .find(|m| m.team_id == team_id && m.user_id == user_id)
            .cloned())
    }

    async fn find_by_team(&self, team_id: i64) -> Result<Vec<TeamMembership>, TeamError> {
        let memberships = self
            .memberships
            .read()
            .map_err(|_| TeamError::Internal("lock poisoned".into()))?;

        let mut rows: Vec<TeamMembership> = memberships
            .values()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.id);

        Ok(rows)
    }

    async fn delete_by_team_and_user(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<bool, TeamError> {
        let mut memberships = self
            .memberships
            .write()
            .map_err(|_| TeamError::Internal("lock poisoned".into()))?;

        let id = memberships
            .values()
            .find(|m| m.team_id == team_id && m.user_id == user_id)
            .map(|m| m.id);

        match id {
            Some(id) => {
                memberships.remove(&id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub struct MockTeamInvitationRepository {
    invitations: RwLock<HashMap<i64, TeamInvitation>>,
    next_id: AtomicI64,
}

impl MockTeamInvitationRepository {
    pub fn new() -> Self {
        Self {
            invitations: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MockTeamInvitationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TeamInvitationRepository for MockTeamInvitationRepository {
    async fn create(&self, data: CreateInvitation) -> Result<TeamInvitation, TeamError> {
        let mut invitations = self
            .invitations
            .write()
            .map_err(|_| TeamError::Internal("lock poisoned".into()))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let invitation = TeamInvitation {
            id,
            team_id: data.team_id,
            email: data.email,
            role: data.role,
            created_at: Utc::now(),
        };
        invitations.insert(id, invitation.clone());

        Ok(invitation)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<TeamInvitation>, TeamError> {
        let invitations = self
            .invitations
            .read()
            .map_err(|_| TeamError::Internal("lock poisoned".into()))?;
        Ok(invitations.get(&id).cloned())
    }

    async fn find_pending_by_email(
        &self,
        email: &str,
    ) -> Result<Vec<TeamInvitation>, TeamError> {
        let invitations = self
            .invitations
            .read()
            .map_err(|_| TeamError::Internal("lock poisoned".into()))?;

        let mut rows: Vec<TeamInvitation> = invitations
            .values()
            .filter(|i| i.email == email)
            .cloned()
            .collect();
        rows.sort_by_key(|i| i.id);

        Ok(rows)
    }

    async fn delete(&self, id: i64) -> Result<(), TeamError> {
        let mut invitations = self
            .invitations
            .write()
            .map_err(|_| TeamError::Internal("lock poisoned".into()))?;

        invitations.remove(&id).map(|_| ()).ok_or(TeamError::NotFound)
    }
}

/// Transaction manager for the in-memory mocks: a single async mutex
/// serializes transactions, which is enough to make racing resolutions
/// observe each other's commits.
pub struct MockTransactionManager {
    gate: tokio::sync::Mutex<()>,
}

impl MockTransactionManager {
    pub fn new() -> Self {
        Self {
            gate: tokio::sync::Mutex::new(()),
        }
    }
}

impl Default for MockTransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionManager for MockTransactionManager {
    async fn run<T, F, Fut>(&self, op: F) -> Result<T, TeamError>
    where
        T: Send,
        F: FnOnce() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, TeamError>> + Send,
    {
        let _guard = self.gate.lock().await;
        op().await
    }
}

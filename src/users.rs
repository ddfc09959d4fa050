//! User entity and repository seam.
//!
//! The membership core only touches users through [`UserRepository`];
//! credential verification and session handling live elsewhere.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TeamError;

/// An application user.
///
/// `current_team_id` is a weak pointer to the team the user is working
/// in, not an ownership edge. Once a user has any team it is never null;
/// the lifecycle manager self-heals it after removals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub current_team_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub hashed_password: String,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates a user. The email is unique; a duplicate fails with
    /// `Validation(EmailTaken)`.
    async fn create(&self, data: CreateUser) -> Result<User, TeamError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, TeamError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, TeamError>;
    async fn email_exists(&self, email: &str) -> Result<bool, TeamError>;
    /// Persists the current-team pointer. `None` dissociates the user
    /// from any team context.
    async fn set_current_team(
        &self,
        user_id: i64,
        team_id: Option<i64>,
    ) -> Result<User, TeamError>;
}

#[cfg(any(test, feature = "mocks"))]
pub use mock::MockUserRepository;

#[cfg(any(test, feature = "mocks"))]
mod mock {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::RwLock;

    use super::*;
    use crate::ValidationError;

    pub struct MockUserRepository {
        users: RwLock<HashMap<i64, User>>,
        next_id: AtomicI64,
    }

    impl MockUserRepository {
        pub fn new() -> Self {
            Self {
                users: RwLock::new(HashMap::new()),
                next_id: AtomicI64::new(1),
            }
        }
    }

    impl Default for MockUserRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn create(&self, data: CreateUser) -> Result<User, TeamError> {
            let mut users = self
                .users
                .write()
                .map_err(|_| TeamError::Internal("lock poisoned".into()))?;

            if users.values().any(|u| u.email == data.email) {
                return Err(TeamError::Validation(ValidationError::EmailTaken));
            }

            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let now = Utc::now();
            let user = User {
                id,
                email: data.email,
                name: data.name,
                hashed_password: data.hashed_password,
                current_team_id: None,
                created_at: now,
                updated_at: now,
            };
            users.insert(id, user.clone());

            Ok(user)
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<User>, TeamError> {
            let users = self
                .users
                .read()
                .map_err(|_| TeamError::Internal("lock poisoned".into()))?;
            Ok(users.get(&id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, TeamError> {
            let users = self
                .users
                .read()
                .map_err(|_| TeamError::Internal("lock poisoned".into()))?;
            Ok(users.values().find(|u| u.email == email).cloned())
        }

        async fn email_exists(&self, email: &str) -> Result<bool, TeamError> {
            let users = self
                .users
                .read()
                .map_err(|_| TeamError::Internal("lock poisoned".into()))?;
            Ok(users.values().any(|u| u.email == email))
        }

        async fn set_current_team(
            &self,
            user_id: i64,
            team_id: Option<i64>,
        ) -> Result<User, TeamError> {
            let mut users = self
                .users
                .write()
                .map_err(|_| TeamError::Internal("lock poisoned".into()))?;

            let user = users.get_mut(&user_id).ok_or(TeamError::NotFound)?;
            user.current_team_id = team_id;
            user.updated_at = Utc::now();

            Ok(user.clone())
        }
    }
}

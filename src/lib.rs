//! Single-active-team membership management.
//!
//! `cohort` implements the team-membership core of a multi-tenant web
//! application: user registration (optionally via invitation), team
//! creation, invitation issuance and resolution, and the invariant that a
//! user belongs to at most one active team at a time.
//!
//! Persistence, mail transport, HTTP routing and signed-URL verification
//! are all trait seams; the crate ships in-memory implementations behind
//! the `mocks` feature for tests and prototyping.

pub mod actions;
pub mod config;
pub mod crypto;
pub mod events;
pub mod notify;
pub mod secret;
pub mod teams;
pub mod users;
pub mod validators;

pub use config::CohortConfig;
pub use crypto::{Argon2Hasher, PasswordHasher};
pub use events::register_event_listeners;
pub use secret::SecretString;
pub use users::{CreateUser, User, UserRepository};
pub use validators::ValidationError;

#[cfg(any(test, feature = "mocks"))]
pub use users::MockUserRepository;

use std::fmt;

/// Errors produced by the membership core.
///
/// The taxonomy is deliberately small: `Validation` is surfaced to the
/// caller for field-level display and never retried, `NotFound` and
/// `Forbidden` are terminal, and `TransactionFailure` is safe to retry
/// from scratch because every multi-step sequence re-reads its inputs
/// under the transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TeamError {
    /// The referenced user, team or invitation does not exist — including
    /// an invitation that was already resolved (resolution deletes it).
    NotFound,
    /// The acting identity is not allowed to perform the operation, e.g.
    /// an invitation resolved by a non-addressed email.
    Forbidden,
    /// Bad input; carries the field-level reason.
    Validation(ValidationError),
    /// Store-level conflict; the whole operation may be retried.
    TransactionFailure(String),
    /// Infrastructure fault (poisoned lock, hashing failure, broken
    /// invariant). Not actionable by the caller.
    Internal(String),
}

impl std::error::Error for TeamError {}

impl fmt::Display for TeamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamError::NotFound => write!(f, "Not found"),
            TeamError::Forbidden => write!(f, "Forbidden"),
            TeamError::Validation(e) => write!(f, "{e}"),
            TeamError::TransactionFailure(msg) => write!(f, "Transaction failure: {msg}"),
            TeamError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl From<ValidationError> for TeamError {
    fn from(e: ValidationError) -> Self {
        TeamError::Validation(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(TeamError::NotFound.to_string(), "Not found");
        assert_eq!(TeamError::Forbidden.to_string(), "Forbidden");
        assert_eq!(
            TeamError::Validation(ValidationError::EmailEmpty).to_string(),
            "Email cannot be empty"
        );
        assert_eq!(
            TeamError::TransactionFailure("conflict".to_owned()).to_string(),
            "Transaction failure: conflict"
        );
    }

    #[test]
    fn test_validation_error_converts() {
        let err: TeamError = ValidationError::TeamNameEmpty.into();
        assert_eq!(err, TeamError::Validation(ValidationError::TeamNameEmpty));
    }
}

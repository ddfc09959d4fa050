//! Outbound notification seam.
//!
//! The core never sends mail itself; it hands the invitation to a
//! [`TeamNotifier`] and moves on. Delivery failures are logged by the
//! caller, never surfaced to the inviting user.

use async_trait::async_trait;

use crate::teams::types::{Team, TeamInvitation};
use crate::TeamError;

#[async_trait]
pub trait TeamNotifier: Send + Sync {
    /// Notifies an address with no account yet; the message should lead
    /// with registration.
    async fn send_invitation(
        &self,
        invitation: &TeamInvitation,
        team: &Team,
    ) -> Result<(), TeamError>;

    /// Notifies an existing user, including where they currently are so
    /// the message can explain what accepting would leave behind.
    async fn send_existing_user_invitation(
        &self,
        invitation: &TeamInvitation,
        team: &Team,
        current_team: Option<&Team>,
    ) -> Result<(), TeamError>;
}

/// Discards every notification. Useful for tests and batch imports.
pub struct NullNotifier;

#[async_trait]
impl TeamNotifier for NullNotifier {
    async fn send_invitation(
        &self,
        _invitation: &TeamInvitation,
        _team: &Team,
    ) -> Result<(), TeamError> {
        Ok(())
    }

    async fn send_existing_user_invitation(
        &self,
        _invitation: &TeamInvitation,
        _team: &Team,
        _current_team: Option<&Team>,
    ) -> Result<(), TeamError> {
        Ok(())
    }
}

#[cfg(any(test, feature = "mocks"))]
pub use recording::{RecordedNotification, RecordingNotifier};

#[cfg(any(test, feature = "mocks"))]
mod recording {
    use std::sync::RwLock;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedNotification {
        NewAccount {
            invitation_id: i64,
            email: String,
        },
        ExistingUser {
            invitation_id: i64,
            email: String,
            current_team_id: Option<i64>,
        },
    }

    /// Captures notifications for assertions.
    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: RwLock<Vec<RecordedNotification>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<RecordedNotification> {
            self.sent.read().map(|s| s.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl TeamNotifier for RecordingNotifier {
        async fn send_invitation(
            &self,
            invitation: &TeamInvitation,
            _team: &Team,
        ) -> Result<(), TeamError> {
            self.sent
                .write()
                .map_err(|_| TeamError::Internal("lock poisoned".into()))?
                .push(RecordedNotification::NewAccount {
                    invitation_id: invitation.id,
                    email: invitation.email.clone(),
                });
            Ok(())
        }

        async fn send_existing_user_invitation(
            &self,
            invitation: &TeamInvitation,
            _team: &Team,
            current_team: Option<&Team>,
        ) -> Result<(), TeamError> {
            self.sent
                .write()
                .map_err(|_| TeamError::Internal("lock poisoned".into()))?
                .push(RecordedNotification::ExistingUser {
                    invitation_id: invitation.id,
                    email: invitation.email.clone(),
                    current_team_id: current_team.map(|t| t.id),
                });
            Ok(())
        }
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Something that happened in the membership core.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TeamEvent {
    UserRegistered {
        user_id: i64,
        via_invitation: bool,
        at: DateTime<Utc>,
    },
    TeamCreated {
        team_id: i64,
        owner_id: i64,
        personal: bool,
        at: DateTime<Utc>,
    },
    MemberRemoved {
        team_id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    },
    InvitationSent {
        invitation_id: i64,
        team_id: i64,
        at: DateTime<Utc>,
    },
    InvitationAccepted {
        invitation_id: i64,
        team_id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    },
    InvitationDeclined {
        invitation_id: i64,
        at: DateTime<Utc>,
    },
}

impl TeamEvent {
    pub fn user_registered(user_id: i64, via_invitation: bool) -> Self {
        Self::UserRegistered {
            user_id,
            via_invitation,
            at: Utc::now(),
        }
    }

    pub fn team_created(team_id: i64, owner_id: i64, personal: bool) -> Self {
        Self::TeamCreated {
            team_id,
            owner_id,
            personal,
            at: Utc::now(),
        }
    }

    pub fn member_removed(team_id: i64, user_id: i64) -> Self {
        Self::MemberRemoved {
            team_id,
            user_id,
            at: Utc::now(),
        }
    }

    pub fn invitation_sent(invitation_id: i64, team_id: i64) -> Self {
        Self::InvitationSent {
            invitation_id,
            team_id,
            at: Utc::now(),
        }
    }

    pub fn invitation_accepted(invitation_id: i64, team_id: i64, user_id: i64) -> Self {
        Self::InvitationAccepted {
            invitation_id,
            team_id,
            user_id,
            at: Utc::now(),
        }
    }

    pub fn invitation_declined(invitation_id: i64) -> Self {
        Self::InvitationDeclined {
            invitation_id,
            at: Utc::now(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::UserRegistered { .. } => "user.registered",
            Self::TeamCreated { .. } => "team.created",
            Self::MemberRemoved { .. } => "team.member_removed",
            Self::InvitationSent { .. } => "invitation.sent",
            Self::InvitationAccepted { .. } => "invitation.accepted",
            Self::InvitationDeclined { .. } => "invitation.declined",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::UserRegistered { at, .. }
            | Self::TeamCreated { at, .. }
            | Self::MemberRemoved { at, .. }
            | Self::InvitationSent { at, .. }
            | Self::InvitationAccepted { at, .. }
            | Self::InvitationDeclined { at, .. } => *at,
        }
    }
}

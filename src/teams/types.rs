//! Team domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A team. Ownership is a column, not a membership row: the owner of a
/// team does not necessarily appear in its membership table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    /// Personal teams are created for the user at registration (or by
    /// self-healing) rather than explicitly.
    pub personal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }
}

/// A membership row linking a non-owner user to a team with a role key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMembership {
    pub id: i64,
    pub team_id: i64,
    pub user_id: i64,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A pending invitation, addressed to an email rather than a user so it
/// can precede registration. Resolution deletes the row; there is no
/// accepted or declined state to query afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInvitation {
    pub id: i64,
    pub team_id: i64,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

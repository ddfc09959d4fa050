pub mod email;
pub mod password;
pub mod team_name;

pub use email::validate_email;
pub use password::{validate_password, PasswordPolicy};
pub use team_name::validate_team_name;

use serde::{Deserialize, Serialize};

/// Field-level validation failures, surfaced to callers for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationError {
    EmailEmpty,
    EmailTooLong,
    EmailInvalidFormat,
    EmailTaken,
    PasswordEmpty,
    PasswordTooShort(usize),
    PasswordTooLong(usize),
    PasswordMissingUppercase,
    PasswordMissingLowercase,
    PasswordMissingDigit,
    PasswordMissingSpecial,
    PasswordCommon,
    TeamNameEmpty,
    TeamNameTooLong,
    TeamNameMissing,
    TermsNotAccepted,
    /// The user already owns or belongs to a team; only one active team
    /// per user is allowed.
    AlreadyHasTeam,
    AlreadyMember,
    AlreadyInvited,
    UnknownRole(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailEmpty => write!(f, "Email cannot be empty"),
            Self::EmailTooLong => write!(f, "Email is too long (max 254 characters)"),
            Self::EmailInvalidFormat => write!(f, "Invalid email format"),
            Self::EmailTaken => write!(f, "An account with this email already exists"),
            Self::PasswordEmpty => write!(f, "Password cannot be empty"),
            Self::PasswordTooShort(min) => {
                write!(f, "Password must be at least {min} characters")
            }
            Self::PasswordTooLong(max) => {
                write!(f, "Password is too long (max {max} characters)")
            }
            Self::PasswordMissingUppercase => {
                write!(f, "Password must contain an uppercase letter")
            }
            Self::PasswordMissingLowercase => {
                write!(f, "Password must contain a lowercase letter")
            }
            Self::PasswordMissingDigit => write!(f, "Password must contain a digit"),
            Self::PasswordMissingSpecial => {
                write!(f, "Password must contain a special character")
            }
            Self::PasswordCommon => write!(f, "Password is too common"),
            Self::TeamNameEmpty => write!(f, "Team name cannot be empty"),
            Self::TeamNameTooLong => write!(f, "Team name is too long (max 255 characters)"),
            Self::TeamNameMissing => {
                write!(f, "A team name is required when registering without an invitation")
            }
            Self::TermsNotAccepted => write!(f, "The terms of service must be accepted"),
            Self::AlreadyHasTeam => {
                write!(f, "You already have a team. You can only belong to one team at a time")
            }
            Self::AlreadyMember => write!(f, "User is already a member of this team"),
            Self::AlreadyInvited => {
                write!(f, "This email already has a pending invitation to the team")
            }
            Self::UnknownRole(key) => write!(f, "Unknown role: {key}"),
        }
    }
}

impl std::error::Error for ValidationError {}

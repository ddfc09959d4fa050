use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Configuration for password validation rules.
///
/// # Examples
///
/// ```
/// use cohort::validators::PasswordPolicy;
///
/// // Default policy: 8-128 characters, no special requirements
/// let policy = PasswordPolicy::default();
/// assert!(policy.validate("password123").is_ok());
///
/// // Strict policy: 12+ chars, uppercase, lowercase, digit, special char
/// let strict = PasswordPolicy::strict();
/// assert!(strict.validate("MyP@ssw0rd123").is_ok());
/// assert!(strict.validate("weak").is_err());
/// ```
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordPolicy {
    /// Minimum password length (default: 8)
    pub min_length: usize,
    /// Maximum password length (default: 128)
    pub max_length: usize,
    /// Require at least one uppercase letter
    pub require_uppercase: bool,
    /// Require at least one lowercase letter
    pub require_lowercase: bool,
    /// Require at least one digit
    pub require_digit: bool,
    /// Require at least one special character
    pub require_special: bool,
    /// List of disallowed common passwords
    #[serde(default)]
    pub disallowed_passwords: Vec<String>,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_uppercase: false,
            require_lowercase: false,
            require_digit: false,
            require_special: false,
            disallowed_passwords: Vec::new(),
        }
    }
}

impl PasswordPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a strict password policy suitable for production:
    /// minimum 12 characters with uppercase, lowercase, digit and special
    /// character requirements.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            min_length: 12,
            max_length: 128,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
            disallowed_passwords: Vec::new(),
        }
    }

    #[must_use]
    pub fn min(mut self, len: usize) -> Self {
        self.min_length = len;
        self
    }

    #[must_use]
    pub fn max(mut self, len: usize) -> Self {
        self.max_length = len;
        self
    }

    #[must_use]
    pub fn require_uppercase(mut self) -> Self {
        self.require_uppercase = true;
        self
    }

    #[must_use]
    pub fn require_lowercase(mut self) -> Self {
        self.require_lowercase = true;
        self
    }

    #[must_use]
    pub fn require_digit(mut self) -> Self {
        self.require_digit = true;
        self
    }

    #[must_use]
    pub fn require_special(mut self) -> Self {
        self.require_special = true;
        self
    }

    #[must_use]
    pub fn disallowed_passwords(mut self, passwords: Vec<String>) -> Self {
        self.disallowed_passwords = passwords;
        self
    }

    /// Validates a password against this policy.
    pub fn validate(&self, password: &str) -> Result<(), ValidationError> {
        if password.is_empty() {
            return Err(ValidationError::PasswordEmpty);
        }

        if password.len() < self.min_length {
            return Err(ValidationError::PasswordTooShort(self.min_length));
        }

        if password.len() > self.max_length {
            return Err(ValidationError::PasswordTooLong(self.max_length));
        }

        if self.require_uppercase && !password.chars().any(char::is_uppercase) {
            return Err(ValidationError::PasswordMissingUppercase);
        }

        if self.require_lowercase && !password.chars().any(char::is_lowercase) {
            return Err(ValidationError::PasswordMissingLowercase);
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(ValidationError::PasswordMissingDigit);
        }

        if self.require_special && !password.chars().any(is_special_char) {
            return Err(ValidationError::PasswordMissingSpecial);
        }

        // Blocklist check (case-insensitive)
        if self
            .disallowed_passwords
            .iter()
            .any(|p| p.eq_ignore_ascii_case(password))
        {
            return Err(ValidationError::PasswordCommon);
        }

        Ok(())
    }
}

fn is_special_char(c: char) -> bool {
    c.is_ascii_graphic() && !c.is_ascii_alphanumeric()
}

/// Validates a password using the default policy (8-128 characters).
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    PasswordPolicy::default().validate(password)
}

//! Configuration for the membership core.

use crate::validators::PasswordPolicy;

/// Settings for registration and team membership behavior.
///
/// # Example
///
/// ```rust
/// use cohort::CohortConfig;
/// use cohort::validators::PasswordPolicy;
///
/// let config = CohortConfig {
///     password_policy: PasswordPolicy::strict(),
///     require_terms: true,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct CohortConfig {
    /// Password complexity policy applied at registration.
    pub password_policy: PasswordPolicy,

    /// When true, registration rejects input without terms acceptance.
    pub require_terms: bool,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            password_policy: PasswordPolicy::default(),
            require_terms: false,
        }
    }
}

impl CohortConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Production settings: strict password policy, terms required.
    pub fn production() -> Self {
        Self {
            password_policy: PasswordPolicy::strict(),
            require_terms: true,
        }
    }
}

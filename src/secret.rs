//! Sensitive data wrapper types.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A wrapper for sensitive string data that prevents accidental logging.
///
/// `SecretString` implements `Debug` and `Display` to show `[REDACTED]`
/// instead of the actual content. Registration inputs carry the plain
/// password in one of these so a logged input struct never leaks it.
///
/// # Example
///
/// ```rust
/// use cohort::SecretString;
///
/// let password = SecretString::new("my_secret_password");
/// assert_eq!(format!("{:?}", password), "SecretString([REDACTED])");
/// assert_eq!(password.expose_secret(), "my_secret_password");
/// ```
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the secret value. Use only at the point where the plain
    /// value is actually needed, such as handing it to a hasher.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Serialization exposes the value; redaction is for Debug/Display only
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(SecretString(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacted() {
        let secret = SecretString::new("my_password");
        assert_eq!(format!("{secret:?}"), "SecretString([REDACTED])");
    }

    #[test]
    fn test_display_redacted() {
        let secret = SecretString::new("my_password");
        assert_eq!(format!("{secret}"), "[REDACTED]");
    }

    #[test]
    fn test_expose_secret() {
        let secret = SecretString::new("my_password");
        assert_eq!(secret.expose_secret(), "my_password");
    }

    #[test]
    fn test_from_impls() {
        let a: SecretString = String::from("password").into();
        let b: SecretString = "password".into();
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_roundtrip() {
        let original = SecretString::new("secret_value");
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(json, "\"secret_value\"");
        let restored: SecretString = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }
}

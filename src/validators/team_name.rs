use super::ValidationError;

pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::TeamNameEmpty);
    }

    if trimmed.len() > 255 {
        return Err(ValidationError::TeamNameTooLong);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_team_name("Crew").is_ok());
        assert!(validate_team_name("Acme Inc.").is_ok());
        assert!(validate_team_name("日本チーム").is_ok());
    }

    #[test]
    fn test_name_empty() {
        assert_eq!(
            validate_team_name("").unwrap_err(),
            ValidationError::TeamNameEmpty
        );
        assert_eq!(
            validate_team_name("   ").unwrap_err(),
            ValidationError::TeamNameEmpty
        );
    }

    #[test]
    fn test_name_too_long() {
        let long_name = "a".repeat(256);
        assert_eq!(
            validate_team_name(&long_name).unwrap_err(),
            ValidationError::TeamNameTooLong
        );
    }
}

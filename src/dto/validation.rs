//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dao::models::{PARTY_CODE_LENGTH, PLAYER_NAME_CHAR_MAX};
use crate::services::codes;

/// Validates that a display name has 1 to 128 meaningful characters.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("player_name_empty");
        err.message = Some("Player name must not be blank".into());
        return Err(err);
    }

    if trimmed.chars().count() > PLAYER_NAME_CHAR_MAX {
        let mut err = ValidationError::new("player_name_length");
        err.message =
            Some(format!("Player name must be at most {PLAYER_NAME_CHAR_MAX} characters").into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a join code has the right length and alphabet.
pub fn validate_party_code(code: &str) -> Result<(), ValidationError> {
    if !codes::is_valid_code(code.trim(), PARTY_CODE_LENGTH) {
        let mut err = ValidationError::new("party_code_format");
        err.message = Some(
            format!("Party code must be {PARTY_CODE_LENGTH} characters from the code alphabet")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates one pronoun token.
pub fn validate_pronoun_token(token: &str) -> Result<(), ValidationError> {
    if token.trim().is_empty() {
        let mut err = ValidationError::new("pronoun_empty");
        err.message = Some("Pronoun tokens must not be blank".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_names_must_have_substance() {
        assert!(validate_player_name("Robin").is_ok());
        assert!(validate_player_name("  Robin  ").is_ok());
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name("   ").is_err());
        assert!(validate_player_name(&"x".repeat(129)).is_err());
        assert!(validate_player_name(&"x".repeat(128)).is_ok());
    }

    #[test]
    fn party_codes_follow_the_alphabet() {
        assert!(validate_party_code("BCDFGH").is_ok());
        assert!(validate_party_code(" BCDFGH ").is_ok()); // trimmed
        assert!(validate_party_code("BCDFG").is_err()); // short
        assert!(validate_party_code("ABCDEF").is_err()); // vowels
        assert!(validate_party_code("bcdfgh").is_err()); // lowercase
    }

    #[test]
    fn pronoun_tokens_must_not_be_blank() {
        assert!(validate_pronoun_token("she").is_ok());
        assert!(validate_pronoun_token(" ").is_err());
    }
}

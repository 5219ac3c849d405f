use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::dao::models::PronounsEntity;
use crate::dto::validation::validate_pronoun_token;

/// A player's pronoun pair as exchanged with clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PronounsDto {
    /// Subjective token, e.g. "he".
    pub subjective: String,
    /// Objective token, e.g. "him".
    pub objective: String,
}

impl Validate for PronounsDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_pronoun_token(&self.subjective) {
            errors.add("subjective", e);
        }
        if let Err(e) = validate_pronoun_token(&self.objective) {
            errors.add("objective", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl From<PronounsEntity> for PronounsDto {
    fn from(value: PronounsEntity) -> Self {
        Self {
            subjective: value.subjective,
            objective: value.objective,
        }
    }
}

impl From<PronounsDto> for PronounsEntity {
    fn from(value: PronounsDto) -> Self {
        Self {
            subjective: value.subjective.trim().to_owned(),
            objective: value.objective.trim().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tokens_fail_validation() {
        let dto = PronounsDto {
            subjective: "ze".into(),
            objective: " ".into(),
        };
        assert!(dto.validate().is_err());

        let dto = PronounsDto {
            subjective: "ze".into(),
            objective: "zir".into(),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn conversion_to_entity_trims_tokens() {
        let entity: PronounsEntity = PronounsDto {
            subjective: " she ".into(),
            objective: "her".into(),
        }
        .into();
        assert_eq!(entity.subjective, "she");
        assert_eq!(entity.objective, "her");
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::dao::models::ENTRY_CHAR_MAX;
use crate::dto::player::PronounsDto;

/// Payload starting a new round.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartRoundRequest {
    /// Entries per story; clamped server-side to [1, 64], default 1.
    #[serde(default)]
    pub entry_count: Option<u32>,
}

/// Payload submitting one story entry.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EntryRequest {
    /// Position in the submitter's form.
    pub index: u32,
    /// Entry text.
    pub text: String,
}

impl Validate for EntryRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let trimmed = self.text.trim();
        if trimmed.is_empty() || trimmed.chars().count() > ENTRY_CHAR_MAX {
            let mut err = validator::ValidationError::new("entry_text_length");
            err.message =
                Some(format!("Entry text must have 1 to {ENTRY_CHAR_MAX} characters").into());
            errors.add("text", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// The writing prompts for the caller's current form.
#[derive(Debug, Serialize, ToSchema)]
pub struct FormResponse {
    /// Pronoun pair of each story the caller writes into, in form order.
    pub pronouns: Vec<PronounsDto>,
    /// First index whose entry is still unfilled; equals the entry count
    /// once the caller has finished.
    pub start_index: usize,
}

/// One revealed entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct EntryDto {
    /// Entry text.
    pub text: String,
    /// Join-order position of the entry's writer.
    pub author_index: i32,
}

/// One revealed story.
#[derive(Debug, Serialize, ToSchema)]
pub struct StoryResultDto {
    /// Display name of the owning player.
    pub player_name: String,
    /// Pronoun pair snapshotted when the round was built.
    pub pronouns: PronounsDto,
    /// All entries in reading order.
    pub entries: Vec<EntryDto>,
}

/// Every story of the just-completed round.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultsResponse {
    /// Round the stories belong to.
    pub round: u32,
    /// Stories ordered by their owner's join time.
    pub stories: Vec<StoryResultDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_text_bounds_are_enforced() {
        let ok = EntryRequest {
            index: 0,
            text: "and then the fox spoke".into(),
        };
        assert!(ok.validate().is_ok());

        let blank = EntryRequest {
            index: 0,
            text: "   ".into(),
        };
        assert!(blank.validate().is_err());

        let long = EntryRequest {
            index: 0,
            text: "x".repeat(ENTRY_CHAR_MAX + 1),
        };
        assert!(long.validate().is_err());
    }
}

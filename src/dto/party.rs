use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::dto::{
    player::PronounsDto,
    validation::{validate_party_code, validate_player_name},
};

/// Payload creating a party together with its first player.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePartyRequest {
    /// Display name of the creating player.
    pub player_name: String,
    /// Pronoun pair of the creating player.
    pub pronouns: PronounsDto,
}

impl Validate for CreatePartyRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_player_name(&self.player_name) {
            errors.add("player_name", e);
        }
        errors.merge_self("pronouns", self.pronouns.validate());

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload joining an existing party by code or id.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinPartyRequest {
    /// Six-character join code; ignored when `party_id` is supplied.
    #[serde(default)]
    pub party_code: Option<String>,
    /// Direct party identifier.
    #[serde(default)]
    pub party_id: Option<Uuid>,
    /// Display name of the joining player.
    pub player_name: String,
    /// Pronoun pair of the joining player.
    pub pronouns: PronounsDto,
}

impl Validate for JoinPartyRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_player_name(&self.player_name) {
            errors.add("player_name", e);
        }
        if self.party_id.is_none() {
            match &self.party_code {
                Some(code) => {
                    if let Err(e) = validate_party_code(code) {
                        errors.add("party_code", e);
                    }
                }
                None => {
                    let mut err = validator::ValidationError::new("party_missing");
                    err.message = Some("Either party_code or party_id is required".into());
                    errors.add("party_code", err);
                }
            }
        }
        errors.merge_self("pronouns", self.pronouns.validate());

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Credentials and addressing returned after a successful create or join.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinPartyResponse {
    /// Bearer token authenticating the player from now on.
    pub access_token: String,
    /// Join code to share with other players.
    pub party_code: String,
    /// Stable party identifier.
    pub party_id: Uuid,
}

/// One roster row of the status poll.
#[derive(Debug, Serialize, ToSchema)]
pub struct RosterEntryDto {
    /// Display name.
    pub name: String,
    /// Player status wire code.
    pub code: u8,
}

/// Snapshot answering the party status poll.
#[derive(Debug, Serialize, ToSchema)]
pub struct PartyStatusResponse {
    /// Party status wire code.
    pub code: u8,
    /// Current round counter.
    pub round: u32,
    /// Caller's position in the roster, -1 when absent.
    pub player_index: i32,
    /// Join-ordered roster.
    pub players: Vec<RosterEntryDto>,
}

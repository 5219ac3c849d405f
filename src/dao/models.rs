use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::lifecycle::{PartyStatus, PlayerStatus};

/// Maximum number of active (non-left) players in one party.
pub const PARTY_SIZE_MAX: usize = 24;
/// Length of the human-shareable join code.
pub const PARTY_CODE_LENGTH: usize = 6;
/// Maximum length of a player display name.
pub const PLAYER_NAME_CHAR_MAX: usize = 128;
/// Maximum length of one story entry.
pub const ENTRY_CHAR_MAX: usize = 1024;
/// Upper bound for the per-round entry count.
pub const ENTRY_COUNT_MAX: usize = 64;

/// One game session, addressed by a short join code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartyEntity {
    /// Primary key of the party.
    pub id: Uuid,
    /// Unique six-character join code.
    pub code: String,
    /// Current lifecycle status.
    pub status: PartyStatus,
    /// Round counter; 0 until the first round starts.
    pub round: u32,
    /// Deadline after which an external sweep may reclaim the party.
    pub expiration: SystemTime,
}

impl PartyEntity {
    /// Create a fresh lobby party expiring `ttl` from now.
    pub fn new(code: String, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            code,
            status: PartyStatus::InLobby,
            round: 0,
            expiration: SystemTime::now() + ttl,
        }
    }
}

/// The pronoun pair a player writes under, snapshotted into stories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PronounsEntity {
    /// Subjective token, e.g. "she".
    pub subjective: String,
    /// Objective token, e.g. "her".
    pub objective: String,
}

/// One participant of a party.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Primary key of the player.
    pub id: Uuid,
    /// Owning party.
    pub party_id: Uuid,
    /// Display name, unique among the party's active players.
    pub name: String,
    /// Pronoun pair used when this player's story is rendered.
    pub pronouns: PronounsEntity,
    /// Current lifecycle status.
    pub status: PlayerStatus,
    /// Round this player was last activated for.
    pub round: u32,
    /// Join timestamp; orders the roster deterministically.
    pub joined: SystemTime,
}

impl PlayerEntity {
    /// Create a lobby player joined at the current instant.
    pub fn new(party_id: Uuid, name: String, pronouns: PronounsEntity) -> Self {
        Self {
            id: Uuid::new_v4(),
            party_id,
            name,
            pronouns,
            status: PlayerStatus::InLobby,
            round: 0,
            joined: SystemTime::now(),
        }
    }
}

/// One slot of text within a story.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryEntity {
    /// Entry text; empty means unfilled.
    pub text: String,
    /// Join-order position of the writing player; -1 until resolved.
    pub author_index: i32,
}

impl EntryEntity {
    /// An unfilled entry with no resolved author.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            author_index: -1,
        }
    }

    /// Whether text has been written into this slot.
    pub fn is_filled(&self) -> bool {
        !self.text.is_empty()
    }
}

/// The home story of one (party, round, player) tuple.
///
/// `form[i]` names the player whose home story receives this story's
/// owner's entry at index `i`; the owner's own `entries` are written by
/// whichever players carry this story in their forms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoryEntity {
    /// Primary key of the story.
    pub id: Uuid,
    /// Owning party.
    pub party_id: Uuid,
    /// Player this story belongs to.
    pub player_id: Uuid,
    /// Round the story was built for (>= 1).
    pub round: u32,
    /// Owner's pronoun pair at build time.
    pub pronouns: PronounsEntity,
    /// Entry slots, one per form index.
    pub entries: Vec<EntryEntity>,
    /// Round-robin targets, same length as `entries`.
    pub form: Vec<Uuid>,
}

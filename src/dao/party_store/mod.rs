/// In-memory store used by tests and the `memory` storage mode.
pub mod memory;
/// MongoDB-backed store.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{PartyEntity, PlayerEntity, StoryEntity},
    storage::StorageResult,
};

/// Roster subset selected by [`PartyStore::players_for_party`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerFilter {
    /// Every player ever attached to the party, left ones included.
    All,
    /// Players that have not left.
    Active,
    /// Players currently waiting in the lobby.
    InLobby,
    /// Playing or done players activated for the given round.
    ActiveInRound(u32),
}

/// Abstraction over the persistence layer for parties, players, and stories.
///
/// Every call is atomic for a single document only; callers own the
/// cross-document ordering. `players_for_party` returns players sorted by
/// join time, ties broken by id.
pub trait PartyStore: Send + Sync {
    /// Insert a new party document.
    fn insert_party(&self, party: PartyEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a party by id.
    fn find_party(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PartyEntity>>>;
    /// Fetch a party by join code.
    fn find_party_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<PartyEntity>>>;
    /// Replace a party document with the provided state.
    fn save_party(&self, party: PartyEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a party together with its players and stories.
    fn delete_party_cascade(&self, party_id: Uuid) -> BoxFuture<'static, StorageResult<()>>;

    /// Insert a new player document.
    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a player by id.
    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Replace a player document with the provided state.
    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove a player document (join-boundary rollback only).
    fn delete_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>>;
    /// List the party's players matching `filter`, join-ordered.
    fn players_for_party(
        &self,
        party_id: Uuid,
        filter: PlayerFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;

    /// Insert one round's stories as a batch of per-document writes.
    fn insert_stories(&self, stories: Vec<StoryEntity>) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace a story document with the provided state.
    fn save_story(&self, story: StoryEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch the story owned by `player_id` for the given round.
    fn find_story(
        &self,
        party_id: Uuid,
        player_id: Uuid,
        round: u32,
    ) -> BoxFuture<'static, StorageResult<Option<StoryEntity>>>;
    /// List every story of the given round.
    fn stories_for_round(
        &self,
        party_id: Uuid,
        round: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<StoryEntity>>>;

    /// Probe backend connectivity.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

impl PlayerFilter {
    /// Whether `player` belongs to the subset this filter selects.
    pub fn matches(self, player: &PlayerEntity) -> bool {
        use crate::state::lifecycle::PlayerStatus;

        match self {
            PlayerFilter::All => true,
            PlayerFilter::Active => player.status.is_active(),
            PlayerFilter::InLobby => player.status == PlayerStatus::InLobby,
            PlayerFilter::ActiveInRound(round) => {
                player.round == round
                    && matches!(player.status, PlayerStatus::Playing | PlayerStatus::Done)
            }
        }
    }
}

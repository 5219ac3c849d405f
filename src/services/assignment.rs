use rand::{Rng, seq::SliceRandom};
use tokio::time::sleep;
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    dao::{
        models::{ENTRY_COUNT_MAX, EntryEntity, PartyEntity, PlayerEntity, StoryEntity},
        party_store::PlayerFilter,
    },
    error::ServiceError,
    state::{
        SharedState,
        lifecycle::{PartyEvent, PartyStatus, PlayerEvent},
    },
};

/// Clamp a requested per-round entry count into the supported range.
pub fn clamp_entry_count(requested: Option<u32>) -> usize {
    requested.unwrap_or(1).clamp(1, ENTRY_COUNT_MAX as u32) as usize
}

/// Build one round's stories for the join-ordered `players`.
///
/// First pass: shuffle player positions once, then give player `i` the form
/// whose target at index `j` is the shuffled player at `(i + j) mod n`, so
/// every player writes exactly `entry_count` entries and every story
/// receives exactly `entry_count` entries. Second pass, once every form is
/// known: record each writer's join-order position on the entry their text
/// will land in. The author table of one story depends on every other
/// player's form, which is why the passes cannot be fused.
pub fn build_round_stories<R: Rng>(
    party: &PartyEntity,
    players: &[PlayerEntity],
    entry_count: usize,
    rng: &mut R,
) -> Vec<StoryEntity> {
    let n = players.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut stories: Vec<StoryEntity> = players
        .iter()
        .enumerate()
        .map(|(i, owner)| StoryEntity {
            id: Uuid::new_v4(),
            party_id: party.id,
            player_id: owner.id,
            round: party.round,
            pronouns: owner.pronouns.clone(),
            entries: (0..entry_count).map(|_| EntryEntity::empty()).collect(),
            form: (0..entry_count)
                .map(|j| players[order[(i + j) % n]].id)
                .collect(),
        })
        .collect();

    for i in 0..n {
        for j in 0..entry_count {
            let target = order[(i + j) % n];
            stories[target].entries[j].author_index = i as i32;
        }
    }

    stories
}

/// Run the assignment engine for `party_id` once the grace interval elapsed.
///
/// Spawned by a successful round start; the caller does not wait for it.
pub fn schedule_build(state: SharedState, party_id: Uuid, entry_count: usize) {
    tokio::spawn(async move {
        sleep(state.config().grace_interval()).await;
        if let Err(err) = build_round(&state, party_id, entry_count).await {
            // Not retried: the party parks in Starting, visible to operators.
            error!(%party_id, error = %err, "failed to build round stories");
        }
    });
}

async fn build_round(
    state: &SharedState,
    party_id: Uuid,
    entry_count: usize,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;

    let Some(mut party) = store.find_party(party_id).await? else {
        debug!(%party_id, "party vanished before its round was built");
        return Ok(());
    };
    if party.status != PartyStatus::Starting {
        debug!(%party_id, status = party.status.name(), "skipping stale build request");
        return Ok(());
    }

    let players = store
        .players_for_party(party_id, PlayerFilter::Active)
        .await?;

    let stories = {
        let mut rng = rand::rng();
        build_round_stories(&party, &players, entry_count, &mut rng)
    };
    store.insert_stories(stories).await?;

    for mut player in players {
        player.status = player.status.transition(PlayerEvent::Activate)?;
        player.round = party.round;
        store.save_player(player).await?;
    }

    party.status = party.status.transition(PartyEvent::StoriesBuilt)?;
    store.save_party(party).await?;

    debug!(%party_id, entry_count, "round stories built");
    Ok(())
}

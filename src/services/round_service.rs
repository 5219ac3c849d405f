use std::{collections::HashMap, sync::Arc};

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{PartyEntity, StoryEntity},
        party_store::{PartyStore, PlayerFilter},
    },
    dto::round::{EntryDto, FormResponse, ResultsResponse, StoryResultDto},
    error::ServiceError,
    services::{assignment, completion},
    state::{
        SharedState,
        lifecycle::{PartyEvent, PartyStatus, PlayerEvent, PlayerStatus},
    },
};

/// Start a new round for the caller's party.
///
/// Returns as soon as the party is `Starting`; the assignment engine runs
/// after the grace interval so that join-time reads settle first.
pub async fn start_round(
    state: &SharedState,
    party_id: Uuid,
    entry_count: Option<u32>,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;

    let Some(mut party) = store.find_party(party_id).await? else {
        return Err(ServiceError::NotFound("party not found".into()));
    };
    let next = party.status.transition(PartyEvent::StartRound)?;

    let lobby = store
        .players_for_party(party_id, PlayerFilter::InLobby)
        .await?;
    if lobby.len() < 2 {
        return Err(ServiceError::TooFewPlayers);
    }

    party.status = next;
    party.round += 1;
    store.save_party(party.clone()).await?;

    let entry_count = assignment::clamp_entry_count(entry_count);
    info!(%party_id, round = party.round, entry_count, "round starting");
    assignment::schedule_build(state.clone(), party_id, entry_count);

    Ok(())
}

/// Describe the caller's form: the pronouns of every story it writes into
/// and the first index still awaiting text.
pub async fn get_form(
    state: &SharedState,
    party_id: Uuid,
    player_id: Uuid,
) -> Result<FormResponse, ServiceError> {
    let store = state.require_store().await?;

    let party = writable_party(&store, party_id).await?;
    let Some(story) = store.find_story(party_id, player_id, party.round).await? else {
        return Err(ServiceError::NotFound(
            "no story for the current round".into(),
        ));
    };

    let stories = form_stories(&store, &party, &story.form).await?;
    let start_index = (0..stories.len())
        .find(|&i| !stories[i].entries[i].is_filled())
        .unwrap_or(stories.len());

    Ok(FormResponse {
        pronouns: stories.into_iter().map(|s| s.pronouns.into()).collect(),
        start_index,
    })
}

/// Write one entry into the story the caller's form designates at `index`.
///
/// A slot that already holds text is rejected with `EntryAlreadyExists`, so
/// duplicate or concurrently retried submissions keep the first text and
/// corrupt nothing.
pub async fn submit_entry(
    state: &SharedState,
    party_id: Uuid,
    player_id: Uuid,
    index: u32,
    text: &str,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;

    let party = writable_party(&store, party_id).await?;
    let Some(story) = store.find_story(party_id, player_id, party.round).await? else {
        return Err(ServiceError::NotFound(
            "no story for the current round".into(),
        ));
    };

    let index = index as usize;
    if index >= story.entries.len() {
        return Err(ServiceError::NotFound("entry index out of range".into()));
    }

    let text = text.trim();
    if text.is_empty() {
        return Err(ServiceError::InvalidInput("entry text is blank".into()));
    }

    let target_owner = story.form[index];
    let Some(mut target) = store.find_story(party_id, target_owner, party.round).await? else {
        return Err(ServiceError::NotFound(
            "no story for the targeted player".into(),
        ));
    };
    if target.entries[index].is_filled() {
        return Err(ServiceError::EntryAlreadyExists);
    }

    target.entries[index].text = text.to_owned();
    store.save_story(target).await?;

    // Reread the whole form so concurrent submissions are visible when
    // deciding whether this writer just finished.
    let stories = form_stories(&store, &party, &story.form).await?;
    let finished = stories
        .iter()
        .enumerate()
        .all(|(i, s)| s.entries[i].is_filled());

    if finished {
        let Some(mut player) = store.find_player(player_id).await? else {
            return Err(ServiceError::NotFound("player not found".into()));
        };
        if player.status == PlayerStatus::Playing {
            player.status = player.status.transition(PlayerEvent::FinishWriting)?;
            store.save_player(player).await?;
            info!(%party_id, %player_id, "player finished writing");
        }

        if party.status == PartyStatus::Playing {
            state.round_checks().trigger(state.clone(), party_id).await;
        }
    }

    Ok(())
}

/// Close the round early on behalf of a player who already finished.
pub async fn end_round(
    state: &SharedState,
    party_id: Uuid,
    player_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;

    let Some(mut party) = store.find_party(party_id).await? else {
        return Err(ServiceError::NotFound("party not found".into()));
    };
    let Some(player) = store.find_player(player_id).await? else {
        return Err(ServiceError::NotFound("player not found".into()));
    };

    if player.status != PlayerStatus::Done {
        return Err(ServiceError::Conflict(
            "only a finished player may end the round".into(),
        ));
    }

    party.status = party.status.transition(PartyEvent::CloseEarly)?;
    store.save_party(party).await?;

    info!(%party_id, %player_id, "round ending early");
    completion::schedule_forced_end(state.clone(), party_id);

    Ok(())
}

/// Reveal the stories of the just-completed round.
pub async fn results(state: &SharedState, party_id: Uuid) -> Result<ResultsResponse, ServiceError> {
    let store = state.require_store().await?;

    let Some(party) = store.find_party(party_id).await? else {
        return Err(ServiceError::NotFound("party not found".into()));
    };
    if party.status != PartyStatus::InLobby || party.round == 0 {
        return Err(ServiceError::Conflict(
            "results are only available between rounds".into(),
        ));
    }

    let stories = store.stories_for_round(party_id, party.round).await?;
    let players = store
        .players_for_party(party_id, PlayerFilter::All)
        .await?;

    let position_of: HashMap<Uuid, usize> = players
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id, i))
        .collect();

    let mut ordered: Vec<StoryEntity> = stories;
    for story in &ordered {
        if !position_of.contains_key(&story.player_id) {
            return Err(ServiceError::Internal(
                "story owner missing from the roster".into(),
            ));
        }
    }
    ordered.sort_by_key(|story| position_of[&story.player_id]);

    let stories = ordered
        .into_iter()
        .map(|story| {
            let owner = &players[position_of[&story.player_id]];
            StoryResultDto {
                player_name: owner.name.clone(),
                pronouns: story.pronouns.into(),
                entries: story
                    .entries
                    .into_iter()
                    .map(|e| EntryDto {
                        text: e.text,
                        author_index: e.author_index,
                    })
                    .collect(),
            }
        })
        .collect();

    Ok(ResultsResponse {
        round: party.round,
        stories,
    })
}

/// Reread the party and require a status that accepts entries.
async fn writable_party(
    store: &Arc<dyn PartyStore>,
    party_id: Uuid,
) -> Result<PartyEntity, ServiceError> {
    let Some(party) = store.find_party(party_id).await? else {
        return Err(ServiceError::NotFound("party not found".into()));
    };
    if !party.status.accepts_entries() {
        return Err(ServiceError::Conflict(format!(
            "round is not writable while the party is {}",
            party.status.name()
        )));
    }
    Ok(party)
}

/// Load the stories referenced by `form`, in form order.
///
/// Every target must have a story this round; a missing one means the
/// round build was interrupted and is reported as internal.
async fn form_stories(
    store: &Arc<dyn PartyStore>,
    party: &PartyEntity,
    form: &[Uuid],
) -> Result<Vec<StoryEntity>, ServiceError> {
    let round_stories = store.stories_for_round(party.id, party.round).await?;
    let by_owner: HashMap<Uuid, StoryEntity> = round_stories
        .into_iter()
        .map(|s| (s.player_id, s))
        .collect();

    // The same owner appears several times in a form once the entry count
    // exceeds the player count, so lookups must not consume the map.
    form.iter()
        .map(|owner| {
            by_owner.get(owner).cloned().ok_or_else(|| {
                ServiceError::Internal("missing a story for a form target".into())
            })
        })
        .collect()
}

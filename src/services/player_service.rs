use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{models::PronounsEntity, party_store::PlayerFilter},
    dto::player::PronounsDto,
    error::ServiceError,
    state::{
        SharedState,
        lifecycle::{PartyStatus, PlayerEvent},
    },
};

/// Read the caller's pronoun pair.
pub async fn pronouns(state: &SharedState, player_id: Uuid) -> Result<PronounsDto, ServiceError> {
    let store = state.require_store().await?;
    let Some(player) = store.find_player(player_id).await? else {
        return Err(ServiceError::NotFound("player not found".into()));
    };
    Ok(player.pronouns.into())
}

/// Update the caller's pronoun pair.
///
/// Stories already built keep the pronouns snapshotted at round build time.
pub async fn set_pronouns(
    state: &SharedState,
    player_id: Uuid,
    pronouns: PronounsDto,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    let Some(mut player) = store.find_player(player_id).await? else {
        return Err(ServiceError::NotFound("player not found".into()));
    };

    let pronouns: PronounsEntity = pronouns.into();
    if pronouns.subjective.is_empty() || pronouns.objective.is_empty() {
        return Err(ServiceError::InvalidInput(
            "pronoun tokens must not be blank".into(),
        ));
    }

    player.pronouns = pronouns;
    store.save_player(player).await?;
    Ok(())
}

/// Mark the caller as departed and react to the emptier party.
///
/// The last active departure deletes the party and everything it owns.
/// Otherwise, a departure during play may make "all remaining writers done"
/// newly true, so the completion coordinator is triggered.
pub async fn leave(
    state: &SharedState,
    party_id: Uuid,
    player_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;

    let Some(mut player) = store.find_player(player_id).await? else {
        return Err(ServiceError::NotFound("player not found".into()));
    };
    player.status = player.status.transition(PlayerEvent::Leave)?;
    store.save_player(player).await?;

    let remaining = store
        .players_for_party(party_id, PlayerFilter::Active)
        .await?;

    if remaining.is_empty() {
        store.delete_party_cascade(party_id).await?;
        info!(%party_id, "last player left; party deleted");
        return Ok(());
    }

    if let Some(party) = store.find_party(party_id).await? {
        if party.status == PartyStatus::Playing {
            state.round_checks().trigger(state.clone(), party_id).await;
        }
    }

    Ok(())
}

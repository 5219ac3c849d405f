use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{PARTY_CODE_LENGTH, PARTY_SIZE_MAX, PartyEntity, PlayerEntity, PronounsEntity},
        party_store::{PartyStore, PlayerFilter},
    },
    dto::party::{
        CreatePartyRequest, JoinPartyRequest, JoinPartyResponse, PartyStatusResponse,
        RosterEntryDto,
    },
    error::ServiceError,
    services::{auth, codes},
    state::{SharedState, lifecycle::PartyStatus},
};

/// Create a party and admit its first player.
pub async fn create_party(
    state: &SharedState,
    request: CreatePartyRequest,
) -> Result<JoinPartyResponse, ServiceError> {
    let store = state.require_store().await?;

    let code = codes::generate_unique(PARTY_CODE_LENGTH, |candidate| {
        let store = store.clone();
        async move { Ok(store.find_party_by_code(candidate).await?.is_none()) }
    })
    .await?;

    let party = PartyEntity::new(code, state.config().party_ttl());
    store.insert_party(party.clone()).await?;
    info!(party_id = %party.id, code = %party.code, "party created");

    let CreatePartyRequest {
        player_name,
        pronouns,
    } = request;
    admit_player(state, &store, &party, &player_name, pronouns.into()).await
}

/// Join an existing party, or reissue credentials on an idempotent rejoin.
pub async fn join_party(
    state: &SharedState,
    request: JoinPartyRequest,
    caller: Option<PlayerEntity>,
) -> Result<JoinPartyResponse, ServiceError> {
    let store = state.require_store().await?;

    let party = match (request.party_id, &request.party_code) {
        (Some(id), _) => store.find_party(id).await?,
        (None, Some(code)) => store.find_party_by_code(code.trim().to_owned()).await?,
        (None, None) => None,
    };
    let Some(party) = party else {
        return Err(ServiceError::NotFound("party not found".into()));
    };

    let name = request.player_name.trim().to_owned();
    let active = store
        .players_for_party(party.id, PlayerFilter::Active)
        .await?;

    // Rejoin: same identity, same name, still an active member. No state
    // change, just a fresh token.
    if let Some(caller) = caller {
        if caller.name == name && active.iter().any(|p| p.id == caller.id) {
            let access_token = auth::mint_access_token(caller.id, state.config())?;
            return Ok(JoinPartyResponse {
                access_token,
                party_code: party.code,
                party_id: party.id,
            });
        }
    }

    if active.len() >= PARTY_SIZE_MAX {
        return Err(ServiceError::PartyFull);
    }
    if active.iter().any(|p| p.name == name) {
        return Err(ServiceError::NameNotAvailable);
    }

    admit_player(state, &store, &party, &name, request.pronouns.into()).await
}

/// Insert a player, then re-check the party constraints that concurrent
/// joins may have violated between our read and our write. The freshly
/// inserted document is rolled back when a constraint lost the race.
async fn admit_player(
    state: &SharedState,
    store: &Arc<dyn PartyStore>,
    party: &PartyEntity,
    name: &str,
    pronouns: PronounsEntity,
) -> Result<JoinPartyResponse, ServiceError> {
    let name = name.trim().to_owned();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("player name is blank".into()));
    }

    let player = PlayerEntity::new(party.id, name, pronouns);
    store.insert_player(player.clone()).await?;

    let others: Vec<PlayerEntity> = store
        .players_for_party(party.id, PlayerFilter::Active)
        .await?
        .into_iter()
        .filter(|p| p.id != player.id)
        .collect();

    if others.len() >= PARTY_SIZE_MAX {
        store.delete_player(player.id).await?;
        return Err(ServiceError::PartyFull);
    }
    if others.iter().any(|p| p.name == player.name) {
        store.delete_player(player.id).await?;
        return Err(ServiceError::NameNotAvailable);
    }

    info!(party_id = %party.id, player_id = %player.id, "player joined");

    let access_token = auth::mint_access_token(player.id, state.config())?;
    Ok(JoinPartyResponse {
        access_token,
        party_code: party.code.clone(),
        party_id: party.id,
    })
}

/// Answer the status poll with the party phase and the visible roster.
///
/// The roster holds every active player, plus current-round players who
/// already left while the round is still underway, so clients can keep
/// rendering their seats until the reveal.
pub async fn party_status(
    state: &SharedState,
    party_id: Uuid,
    player_id: Uuid,
) -> Result<PartyStatusResponse, ServiceError> {
    let store = state.require_store().await?;

    let Some(party) = store.find_party(party_id).await? else {
        return Err(ServiceError::NotFound("party not found".into()));
    };

    let roster: Vec<PlayerEntity> = store
        .players_for_party(party_id, PlayerFilter::All)
        .await?
        .into_iter()
        .filter(|p| {
            p.status.is_active()
                || (party.status != PartyStatus::InLobby && p.round == party.round)
        })
        .collect();

    let player_index = roster
        .iter()
        .position(|p| p.id == player_id)
        .map(|i| i as i32)
        .unwrap_or(-1);

    Ok(PartyStatusResponse {
        code: party.status.code(),
        round: party.round,
        player_index,
        players: roster
            .into_iter()
            .map(|p| RosterEntryDto {
                name: p.name,
                code: p.status.code(),
            })
            .collect(),
    })
}

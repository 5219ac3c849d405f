use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::player::PronounsDto,
    error::AppError,
    services::{auth, player_service},
    state::SharedState,
};

/// Routes handling player-scoped operations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/player/pronouns", get(get_pronouns).put(set_pronouns))
        .route("/player/leave", post(leave_party))
}

/// Read the caller's pronoun pair.
#[utoipa::path(
    get,
    path = "/api/player/pronouns",
    tag = "player",
    responses(
        (status = 200, description = "Pronoun pair", body = PronounsDto),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_pronouns(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<PronounsDto>, AppError> {
    let (_, player) = auth::resolve_session(&state, &headers).await?;
    let pronouns = player_service::pronouns(&state, player.id).await?;
    Ok(Json(pronouns))
}

/// Update the caller's pronoun pair.
#[utoipa::path(
    put,
    path = "/api/player/pronouns",
    tag = "player",
    request_body = PronounsDto,
    responses(
        (status = 200, description = "Pronouns updated"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn set_pronouns(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Valid(Json(payload)): Valid<Json<PronounsDto>>,
) -> Result<(), AppError> {
    let (_, player) = auth::resolve_session(&state, &headers).await?;
    player_service::set_pronouns(&state, player.id, payload).await?;
    Ok(())
}

/// Leave the party.
#[utoipa::path(
    post,
    path = "/api/player/leave",
    tag = "player",
    responses(
        (status = 200, description = "Player left"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Player not found")
    )
)]
pub async fn leave_party(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<(), AppError> {
    let (party, player) = auth::resolve_session(&state, &headers).await?;
    player_service::leave(&state, party.id, player.id).await?;
    Ok(())
}

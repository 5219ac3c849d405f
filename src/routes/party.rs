use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::party::{CreatePartyRequest, JoinPartyRequest, JoinPartyResponse, PartyStatusResponse},
    error::AppError,
    services::{auth, party_service},
    state::SharedState,
};

/// Routes handling the party join boundary and the status poll.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/party/create", post(create_party))
        .route("/party/join", post(join_party))
        .route("/party/status", get(party_status))
}

/// Create a party with an initial player.
#[utoipa::path(
    post,
    path = "/api/party/create",
    tag = "party",
    request_body = CreatePartyRequest,
    responses(
        (status = 200, description = "Party created and joined", body = JoinPartyResponse)
    )
)]
pub async fn create_party(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreatePartyRequest>>,
) -> Result<Json<JoinPartyResponse>, AppError> {
    let response = party_service::create_party(&state, payload).await?;
    Ok(Json(response))
}

/// Join a party, or rejoin it under an existing token.
#[utoipa::path(
    post,
    path = "/api/party/join",
    tag = "party",
    request_body = JoinPartyRequest,
    responses(
        (status = 200, description = "Joined party", body = JoinPartyResponse),
        (status = 404, description = "Party not found"),
        (status = 460, description = "Name already used in party"),
        (status = 461, description = "Party is full")
    )
)]
pub async fn join_party(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Valid(Json(payload)): Valid<Json<JoinPartyRequest>>,
) -> Result<Json<JoinPartyResponse>, AppError> {
    let caller = auth::optional_player(&state, &headers).await;
    let response = party_service::join_party(&state, payload, caller).await?;
    Ok(Json(response))
}

/// Poll the party status and roster.
#[utoipa::path(
    get,
    path = "/api/party/status",
    tag = "party",
    responses(
        (status = 200, description = "Current party status", body = PartyStatusResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Player or party not found")
    )
)]
pub async fn party_status(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<PartyStatusResponse>, AppError> {
    let (party, player) = auth::resolve_session(&state, &headers).await?;
    let response = party_service::party_status(&state, party.id, player.id).await?;
    Ok(Json(response))
}

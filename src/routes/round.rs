use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::round::{EntryRequest, FormResponse, ResultsResponse, StartRoundRequest},
    error::AppError,
    services::{auth, round_service},
    state::SharedState,
};

/// Routes driving the round lifecycle.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/round/start", post(start_round))
        .route("/round/form", get(get_form))
        .route("/round/entry", post(submit_entry))
        .route("/round/end", post(end_round))
        .route("/round/results", get(round_results))
}

/// Start a round for the caller's party.
#[utoipa::path(
    post,
    path = "/api/round/start",
    tag = "round",
    request_body = StartRoundRequest,
    responses(
        (status = 200, description = "Round starting"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Party is not in the lobby"),
        (status = 463, description = "Too few players")
    )
)]
pub async fn start_round(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<StartRoundRequest>,
) -> Result<(), AppError> {
    let (party, _) = auth::resolve_session(&state, &headers).await?;
    round_service::start_round(&state, party.id, payload.entry_count).await?;
    Ok(())
}

/// Fetch the caller's form for the active round.
#[utoipa::path(
    get,
    path = "/api/round/form",
    tag = "round",
    responses(
        (status = 200, description = "Form prompts", body = FormResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No story for the current round"),
        (status = 409, description = "No round is writable")
    )
)]
pub async fn get_form(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<FormResponse>, AppError> {
    let (party, player) = auth::resolve_session(&state, &headers).await?;
    let form = round_service::get_form(&state, party.id, player.id).await?;
    Ok(Json(form))
}

/// Submit one story entry.
#[utoipa::path(
    post,
    path = "/api/round/entry",
    tag = "round",
    request_body = EntryRequest,
    responses(
        (status = 200, description = "Entry recorded"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No story or index out of range"),
        (status = 409, description = "No round is writable"),
        (status = 462, description = "Entry already exists at this index")
    )
)]
pub async fn submit_entry(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Valid(Json(payload)): Valid<Json<EntryRequest>>,
) -> Result<(), AppError> {
    let (party, player) = auth::resolve_session(&state, &headers).await?;
    round_service::submit_entry(&state, party.id, player.id, payload.index, &payload.text).await?;
    Ok(())
}

/// Close the round early.
#[utoipa::path(
    post,
    path = "/api/round/end",
    tag = "round",
    responses(
        (status = 200, description = "Round ending"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Round cannot be ended by this caller now")
    )
)]
pub async fn end_round(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<(), AppError> {
    let (party, player) = auth::resolve_session(&state, &headers).await?;
    round_service::end_round(&state, party.id, player.id).await?;
    Ok(())
}

/// Fetch the stories of the just-completed round.
#[utoipa::path(
    get,
    path = "/api/round/results",
    tag = "round",
    responses(
        (status = 200, description = "Round stories", body = ResultsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "No completed round to reveal")
    )
)]
pub async fn round_results(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<ResultsResponse>, AppError> {
    let (party, _) = auth::resolve_session(&state, &headers).await?;
    let results = round_service::results(&state, party.id).await?;
    Ok(Json(results))
}

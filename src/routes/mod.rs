use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod party;
pub mod player;
pub mod round;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(party::router())
        .merge(player::router())
        .merge(round::router());

    let docs_router = docs::router(state.clone());

    Router::new()
        .nest("/api", api_router)
        .merge(docs_router)
        .with_state(state)
}

use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the backend can currently reach its storage.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.party_store().await {
        Some(store) => match store.health_check().await {
            Ok(()) => HealthResponse::ok(),
            Err(err) => {
                warn!(error = %err, "health check failed against storage");
                HealthResponse::degraded()
            }
        },
        None => HealthResponse::degraded(),
    }
}

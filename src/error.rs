use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::lifecycle::InvalidTransition};

/// Custom status code returned when a join-time name collides.
const NAME_NOT_AVAILABLE: u16 = 460;
/// Custom status code returned when a party is at capacity.
const PARTY_FULL: u16 = 461;
/// Custom status code returned when a story entry is already filled.
const ENTRY_ALREADY_EXISTS: u16 = 462;
/// Custom status code returned when a round is started with too few players.
const TOO_FEW_PLAYERS: u16 = 463;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed mid-operation.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// The caller's token is missing, invalid, or expired.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A lifecycle guard rejected the operation in the current status.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Requested party, player, or story was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// A round start was attempted with fewer than two lobby players.
    #[error("too few players to start a round")]
    TooFewPlayers,
    /// The targeted entry slot already holds text.
    #[error("an entry already exists at this index")]
    EntryAlreadyExists,
    /// The requested display name is taken by an active player.
    #[error("player name is not available in this party")]
    NameNotAvailable,
    /// The party already holds the maximum number of active players.
    #[error("party is full")]
    PartyFull,
    /// An invariant was violated or a multi-document write failed partway.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::Conflict(err.to_string())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with the current lifecycle status.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Display name already taken (460).
    #[error("name not available")]
    NameNotAvailable,
    /// Party at capacity (461).
    #[error("party full")]
    PartyFull,
    /// Entry slot already filled (462).
    #[error("entry already exists")]
    EntryAlreadyExists,
    /// Not enough players to start (463).
    #[error("too few players")]
    TooFewPlayers,
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::TooFewPlayers => AppError::TooFewPlayers,
            ServiceError::EntryAlreadyExists => AppError::EntryAlreadyExists,
            ServiceError::NameNotAvailable => AppError::NameNotAvailable,
            ServiceError::PartyFull => AppError::PartyFull,
            ServiceError::Internal(message) => AppError::Internal(message),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NameNotAvailable => custom_status(NAME_NOT_AVAILABLE),
            AppError::PartyFull => custom_status(PARTY_FULL),
            AppError::EntryAlreadyExists => custom_status(ENTRY_ALREADY_EXISTS),
            AppError::TooFewPlayers => custom_status(TOO_FEW_PLAYERS),
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

fn custom_status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::CONFLICT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_boundary_errors_use_custom_codes() {
        let cases = [
            (AppError::NameNotAvailable, 460),
            (AppError::PartyFull, 461),
            (AppError::EntryAlreadyExists, 462),
            (AppError::TooFewPlayers, 463),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status().as_u16(), expected);
        }
    }

    #[test]
    fn service_errors_map_to_transport_kinds() {
        let conflict: AppError = ServiceError::Conflict("round already running".into()).into();
        assert!(matches!(conflict, AppError::Conflict(_)));

        let not_found: AppError = ServiceError::NotFound("story".into()).into();
        assert!(matches!(not_found, AppError::NotFound(_)));

        let degraded: AppError = ServiceError::Degraded.into();
        assert!(matches!(degraded, AppError::ServiceUnavailable(_)));
    }
}

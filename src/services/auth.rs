use axum::http::{HeaderMap, header};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::models::{PartyEntity, PlayerEntity},
    error::ServiceError,
    state::SharedState,
};

/// Claims carried by a party access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Player identifier the token was issued to.
    pub sub: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Mint an HS256 access token for `player_id` with the configured TTL.
pub fn mint_access_token(player_id: Uuid, config: &AppConfig) -> Result<String, ServiceError> {
    let iat = OffsetDateTime::now_utc().unix_timestamp();
    let exp = iat + config.token_ttl().as_secs() as i64;

    let claims = Claims {
        sub: player_id.to_string(),
        iat,
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret()),
    )
    .map_err(|err| ServiceError::Internal(format!("failed to encode access token: {err}")))
}

/// Verify a token and return the player id it was issued to.
pub fn verify_access_token(token: &str, config: &AppConfig) -> Result<Uuid, ServiceError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|err| ServiceError::Unauthorized(format!("invalid access token: {err}")))?;

    Uuid::parse_str(&data.claims.sub)
        .map_err(|_| ServiceError::Unauthorized("malformed token subject".into()))
}

/// Resolve the caller to a (party, player) pair.
///
/// Missing or invalid credentials are `Unauthorized`; a token whose player
/// or party has since vanished is `NotFound`.
pub async fn resolve_session(
    state: &SharedState,
    headers: &HeaderMap,
) -> Result<(PartyEntity, PlayerEntity), ServiceError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".into()))?;
    let player_id = verify_access_token(token, state.config())?;

    let store = state.require_store().await?;
    let Some(player) = store.find_player(player_id).await? else {
        return Err(ServiceError::NotFound("player no longer exists".into()));
    };
    let Some(party) = store.find_party(player.party_id).await? else {
        return Err(ServiceError::NotFound("party no longer exists".into()));
    };

    Ok((party, player))
}

/// Resolve the caller to a player if valid credentials were supplied.
///
/// Used by the join path, where a token is optional and only enables the
/// idempotent rejoin.
pub async fn optional_player(state: &SharedState, headers: &HeaderMap) -> Option<PlayerEntity> {
    let token = bearer_token(headers)?;
    let player_id = verify_access_token(token, state.config()).ok()?;
    let store = state.party_store().await?;
    store.find_player(player_id).await.ok().flatten()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config() -> AppConfig {
        AppConfig::with_timings(
            Duration::from_millis(10),
            Duration::from_secs(3_600),
            Duration::from_secs(3_600),
        )
    }

    #[test]
    fn token_round_trips_to_the_same_player() {
        let config = config();
        let player_id = Uuid::new_v4();
        let token = mint_access_token(player_id, &config).unwrap();
        assert_eq!(verify_access_token(&token, &config).unwrap(), player_id);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = mint_access_token(Uuid::new_v4(), &config()).unwrap();
        let other = config();
        assert!(matches!(
            verify_access_token(&token, &other),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(
            verify_access_token("not-a-token", &config()),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn bearer_header_is_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        let mut bad = HeaderMap::new();
        bad.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&bad), None);
    }
}

//! Application-level configuration loading: game timings and token settings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use rand::RngCore;
use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "STORYFOLD_CONFIG_PATH";
/// Environment variable carrying the token signing secret.
const JWT_SECRET_ENV: &str = "STORYFOLD_JWT_SECRET";

const DEFAULT_GRACE_INTERVAL_MS: u64 = 3_000;
const DEFAULT_PARTY_TTL_HOURS: u64 = 24;
const DEFAULT_TOKEN_TTL_HOURS: u64 = 24;

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    grace_interval: Duration,
    party_ttl: Duration,
    token_ttl: Duration,
    jwt_secret: Vec<u8>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in
    /// defaults, and resolve the token secret from the environment.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let timings = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded game timings from config");
                    raw
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    RawConfig::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                RawConfig::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                RawConfig::default()
            }
        };

        let jwt_secret = match env::var(JWT_SECRET_ENV) {
            Ok(secret) if !secret.is_empty() => secret.into_bytes(),
            _ => {
                warn!(
                    "{JWT_SECRET_ENV} not set; using an ephemeral secret, \
                     tokens will not survive a restart"
                );
                let mut secret = vec![0u8; 32];
                rand::rng().fill_bytes(&mut secret);
                secret
            }
        };

        Self::from_parts(timings, jwt_secret)
    }

    /// Build a configuration with explicit timings and an ephemeral secret.
    ///
    /// Used by tests and embedders that do not read the config file.
    pub fn with_timings(grace_interval: Duration, party_ttl: Duration, token_ttl: Duration) -> Self {
        let mut secret = vec![0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            grace_interval,
            party_ttl,
            token_ttl,
            jwt_secret: secret,
        }
    }

    fn from_parts(raw: RawConfig, jwt_secret: Vec<u8>) -> Self {
        Self {
            grace_interval: Duration::from_millis(
                raw.grace_interval_ms.unwrap_or(DEFAULT_GRACE_INTERVAL_MS),
            ),
            party_ttl: Duration::from_secs(
                raw.party_ttl_hours.unwrap_or(DEFAULT_PARTY_TTL_HOURS) * 3_600,
            ),
            token_ttl: Duration::from_secs(
                raw.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS) * 3_600,
            ),
            jwt_secret,
        }
    }

    /// Delay before automatic state transitions, letting in-flight writes settle.
    pub fn grace_interval(&self) -> Duration {
        self.grace_interval
    }

    /// Lifetime of a party before external garbage collection may reclaim it.
    pub fn party_ttl(&self) -> Duration {
        self.party_ttl
    }

    /// Lifetime of an issued access token.
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Secret used to sign and verify access tokens.
    pub fn jwt_secret(&self) -> &[u8] {
        &self.jwt_secret
    }
}

/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    grace_interval_ms: Option<u64>,
    party_ttl_hours: Option<u64>,
    token_ttl_hours: Option<u64>,
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Party and player lifecycle state machines.
pub mod lifecycle;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig, dao::party_store::PartyStore, error::ServiceError,
    services::completion::RoundWatch,
};

/// Cheaply cloneable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, degraded flag, round-check
/// registry, and the loaded configuration.
pub struct AppState {
    config: AppConfig,
    party_store: RwLock<Option<Arc<dyn PartyStore>>>,
    degraded: watch::Sender<bool>,
    round_checks: RoundWatch,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`].
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            party_store: RwLock::new(None),
            degraded: degraded_tx,
            round_checks: RoundWatch::new(),
        })
    }

    /// Obtain a handle to the current party store, if one is installed.
    pub async fn party_store(&self) -> Option<Arc<dyn PartyStore>> {
        let guard = self.party_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the party store or fail with [`ServiceError::Degraded`].
    pub async fn require_store(&self) -> Result<Arc<dyn PartyStore>, ServiceError> {
        self.party_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new party store implementation and leave degraded mode.
    pub async fn set_party_store(&self, store: Arc<dyn PartyStore>) {
        {
            let mut guard = self.party_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current party store and enter degraded mode.
    pub async fn clear_party_store(&self) {
        {
            let mut guard = self.party_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.party_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        if self.is_degraded().await == value {
            return;
        }

        let _ = self.degraded.send(value);
    }

    /// Registry holding the single in-flight completion check per party.
    pub fn round_checks(&self) -> &RoundWatch {
        &self.round_checks
    }

    /// Loaded runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

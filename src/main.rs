//! Storyfold Back binary entrypoint wiring REST routes, storage, and tracing.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storyfold_back::{
    config::AppConfig,
    dao::party_store::memory::MemoryPartyStore,
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let state = AppState::new(config);

    install_storage(&state).await;

    let app = build_router(state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Wire the storage backend selected by `STORYFOLD_STORE`.
///
/// The in-memory backend is installed synchronously; MongoDB connects in
/// the background under the storage supervisor, leaving the server in
/// degraded mode until the database answers.
async fn install_storage(state: &SharedState) {
    let backend = env::var("STORYFOLD_STORE").unwrap_or_else(|_| "mongo".into());

    if backend == "memory" {
        info!("using the in-memory store; state will not survive a restart");
        state
            .set_party_store(Arc::new(MemoryPartyStore::new()))
            .await;
        return;
    }

    #[cfg(feature = "mongo-store")]
    {
        use storyfold_back::dao::{
            party_store::{
                PartyStore,
                mongodb::{MongoConfig, MongoPartyStore},
            },
            storage::StorageError,
        };

        tokio::spawn(storage_supervisor::run(state.clone(), || async {
            let config = MongoConfig::from_env().await.map_err(StorageError::from)?;
            let store = MongoPartyStore::connect(config)
                .await
                .map_err(StorageError::from)?;
            Ok(Arc::new(store) as Arc<dyn PartyStore>)
        }));
    }

    #[cfg(not(feature = "mongo-store"))]
    {
        info!("built without mongo-store; falling back to the in-memory store");
        state
            .set_party_store(Arc::new(MemoryPartyStore::new()))
            .await;
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

//! Mission Control Back binary entrypoint wiring REST, SSE and the game store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use futures::{FutureExt, future::BoxFuture};
use mission_control_back::{
    config::AppConfig,
    dao::{
        game_store::{GameStore, memory::MemoryGameStore},
        storage::StorageError,
    },
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Connect = Box<dyn FnMut() -> BoxFuture<'static, Result<Arc<dyn GameStore>, StorageError>> + Send>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());

    tokio::spawn(storage_supervisor::run(app_state.clone(), store_connector()));
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(5000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the storage backend from `STORAGE_BACKEND` (`mongo` by default, or `memory`).
fn store_connector() -> Connect {
    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "mongo".into());
    match backend.as_str() {
        "memory" => memory_connector(),
        #[cfg(feature = "mongo-store")]
        "mongo" => mongo_connector(),
        other => {
            warn!(backend = other, "unsupported storage backend; using the in-memory store");
            memory_connector()
        }
    }
}

fn memory_connector() -> Connect {
    info!("using the in-memory game store; state is lost on restart");
    let store = MemoryGameStore::new();
    Box::new(move || {
        let store = store.clone();
        async move { Ok::<_, StorageError>(Arc::new(store) as Arc<dyn GameStore>) }.boxed()
    })
}

#[cfg(feature = "mongo-store")]
fn mongo_connector() -> Connect {
    use mission_control_back::dao::game_store::mongodb::{MongoConfig, MongoGameStore};

    Box::new(|| {
        async {
            let config = MongoConfig::from_env().await?;
            let store = MongoGameStore::connect(config).await?;
            Ok::<_, StorageError>(Arc::new(store) as Arc<dyn GameStore>)
        }
        .boxed()
    })
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

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

//! gym-server - workout log HTTP service

use gym_core::readiness::{connect, Readiness};
use gym_core::store::{open_store, RecordStore};
use gym_core::{Config, HmacTokenProvider, Result, WorkoutLogService};
use gym_server::{build_router, AppState};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Keep probing the store until it answers
fn spawn_connect_loop(store: Arc<dyn RecordStore>, readiness: Readiness, retry: Duration) {
    tokio::spawn(async move {
        loop {
            let store = Arc::clone(&store);
            let flag = readiness.clone();
            let connected = tokio::task::spawn_blocking(move || connect(store.as_ref(), &flag))
                .await
                .map(|outcome| outcome.is_ok())
                .unwrap_or(false);

            if connected {
                break;
            }
            tracing::warn!("Retrying record store connection in {:?}", retry);
            tokio::time::sleep(retry).await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> Result<()> {
    gym_core::logging::init();

    let config = Config::load()?;
    tracing::debug!("Loaded config: {:?}", config.server);

    let store = open_store(&config);
    let readiness = Readiness::new();
    spawn_connect_loop(
        Arc::clone(&store),
        readiness.clone(),
        Duration::from_secs(config.store.connect_retry_secs.max(1)),
    );

    let identity = Arc::new(HmacTokenProvider::from_config(&config.auth));
    let state = AppState::new(WorkoutLogService::new(store, readiness), identity);

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    tracing::info!("Server ready at http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::{ServeArgs, ServerConfig};
use crate::error::ServerError;
use recsync_api_server::{AppState, cors_layer};
use recsync_engine::{ConnectionRegistry, NotificationBus, RecordService};
use recsync_store::SqliteStore;

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    tracing::info!("recsync-server starting");

    // --- Load config ---
    let config = ServerConfig::load(&args.config)?;
    tracing::info!(config = %args.config, "loaded config");

    // --- CancellationToken for graceful shutdown ---
    let token = CancellationToken::new();

    // --- Store gateway ---
    let store = SqliteStore::connect(
        &config.database_url,
        config.store_max_connections,
        Duration::from_secs(config.store_timeout_secs),
    )
    .await?;
    store.init_schema().await?;
    tracing::info!(url = %config.database_url, "store ready");

    // --- Notification fan-out ---
    let registry = Arc::new(ConnectionRegistry::new(config.ws_buffer));
    let bus = Arc::new(NotificationBus::new(registry.clone()));

    // --- Mutation service ---
    let service = Arc::new(RecordService::new(Arc::new(store), bus));

    // --- API server (HTTP + WS) ---
    let cors = cors_layer(&config.cors_origins)
        .map_err(|detail| ServerError::Config { context: "cors", detail })?;
    let state = AppState {
        service,
        registry,
        shutdown: token.clone(),
    };

    let api_port = config.api_port;
    let mut api_handle = tokio::spawn(async move {
        if let Err(e) = recsync_api_server::run(api_port, state, cors).await {
            tracing::error!(error = %e, "api server error");
        }
    });

    tracing::info!(port = config.api_port, "api server (http+ws) listening");
    tracing::info!("server ready");

    // --- Wait for Ctrl+C ---
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down...");

    // Signal open connections and the accept loop to stop, then give
    // them a bounded window before aborting.
    token.cancel();
    if tokio::time::timeout(Duration::from_secs(5), &mut api_handle)
        .await
        .is_err()
    {
        api_handle.abort();
        let _ = api_handle.await;
    }

    tracing::info!("shutdown complete");
    Ok(())
}

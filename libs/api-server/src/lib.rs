mod http;
mod ws;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::get;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use recsync_engine::{ConnectionRegistry, RecordService};

/// Shared request context: the mutation service for REST handlers,
/// the connection registry for WebSocket attach/detach, and the
/// shutdown token that tells open connections to wind down.
/// Constructed once at startup and cloned into handlers — no ambient
/// globals.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecordService>,
    pub registry: Arc<ConnectionRegistry>,
    pub shutdown: CancellationToken,
}

/// REST + WebSocket API server.
pub async fn run(port: u16, state: AppState, cors: CorsLayer) -> Result<(), String> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|e| format!("bind api :{port}: {e}"))?;
    serve(listener, state, cors).await
}

/// Serve on an already-bound listener (lets callers bind port 0).
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    cors: CorsLayer,
) -> Result<(), String> {
    let shutdown = state.shutdown.clone();
    let app = router(state).layer(cors);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| format!("axum serve: {e}"))?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/records", get(http::handle_list).post(http::handle_create))
        .route(
            "/records/{id}",
            axum::routing::put(http::handle_update).delete(http::handle_delete),
        )
        .route("/ws", get(ws::handle_ws))
        .with_state(state)
}

/// Build the CORS layer from configured origins; `"*"` opens the
/// surface to any caller (the default).
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, String> {
    if origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let mut values = Vec::with_capacity(origins.len());
    for origin in origins {
        let value = origin
            .parse::<HeaderValue>()
            .map_err(|e| format!("invalid cors origin '{origin}': {e}"))?;
        values.push(value);
    }
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(values))
        .allow_methods(Any)
        .allow_headers(Any))
}

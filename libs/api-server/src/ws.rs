use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;

use recsync_api::ChangeEvent;

use super::AppState;

// ═══════════════════════════════════════════════════════════════
//  WebSocket: /ws
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_ws(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(socket, state))
}

/// Wire shape of one change notification. Server→client only; no
/// acknowledgment, no replay — a client must re-fetch on (re)connect.
#[derive(serde::Serialize)]
struct WsChange {
    r#type: &'static str,
    event: &'static str,
    payload: serde_json::Value,
}

impl WsChange {
    fn from_event(event: &ChangeEvent) -> Self {
        Self {
            r#type: "db_change",
            event: event.kind().as_str(),
            payload: event.payload(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Connection handler
// ═══════════════════════════════════════════════════════════════

async fn ws_connection(mut socket: WebSocket, state: AppState) {
    let mut sub = state.registry.attach().await;
    let token = sub.token();
    tracing::info!(token, "client connected");

    loop {
        tokio::select! {
            biased;

            _ = state.shutdown.cancelled() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }

            msg = socket.recv() => {
                match msg {
                    // Inbound traffic is ignored; the channel only
                    // exists to detect disconnects promptly.
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                }
            }

            event = sub.recv() => {
                match event {
                    Some(event) => {
                        let msg = WsChange::from_event(&event);
                        if let Ok(json) = serde_json::to_string(&msg) {
                            if socket.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    None => break,
                }
            }
        }
    }

    state.registry.detach(token).await;
    tracing::info!(token, "client disconnected");
}

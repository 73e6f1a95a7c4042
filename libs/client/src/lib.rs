//! Client sync agent: keeps a local view of the record collection
//! consistent with the server.
//!
//! Reconciliation contract: the agent fetches the full collection once
//! on startup, and re-fetches it on *every* received change
//! notification and on every (re)connect, discarding the notification
//! payload entirely. Re-reading full state instead of applying deltas
//! is what makes the server's at-most-once, unordered delivery
//! acceptable — a missed or reordered event costs nothing but one
//! extra read.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use recsync_api::Record;

// ═══════════════════════════════════════════════════════════════
//  Config
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct SyncAgentConfig {
    /// Base URL of the REST surface, e.g. `http://127.0.0.1:3000`.
    pub http_url: String,
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:3000/ws`.
    pub ws_url: String,
    /// Reconnect attempts before giving up.
    pub reconnect_attempts: usize,
    pub reconnect_delay: Duration,
}

impl SyncAgentConfig {
    pub fn new(http_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            http_url: http_url.into(),
            ws_url: ws_url.into(),
            reconnect_attempts: 5,
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  SyncAgent
// ═══════════════════════════════════════════════════════════════

/// Live view of the server's record collection.
///
/// `records()` yields the latest fetched collection; `connected()` is
/// a display-only boolean, never a hard failure. Dropping the agent
/// stops the background task.
pub struct SyncAgent {
    records: watch::Receiver<Vec<Record>>,
    connected: watch::Receiver<bool>,
    handle: JoinHandle<()>,
}

impl SyncAgent {
    pub fn spawn(config: SyncAgentConfig) -> Self {
        let (records_tx, records) = watch::channel(Vec::new());
        let (connected_tx, connected) = watch::channel(false);
        let handle = tokio::spawn(run(config, records_tx, connected_tx));
        Self { records, connected, handle }
    }

    pub fn records(&self) -> watch::Receiver<Vec<Record>> {
        self.records.clone()
    }

    pub fn connected(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }
}

impl Drop for SyncAgent {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ═══════════════════════════════════════════════════════════════
//  Background task
// ═══════════════════════════════════════════════════════════════

async fn run(
    config: SyncAgentConfig,
    records: watch::Sender<Vec<Record>>,
    connected: watch::Sender<bool>,
) {
    let http = reqwest::Client::new();

    // Initial state precedes any notification.
    refetch(&http, &config.http_url, &records).await;

    let mut attempts = 0;
    loop {
        match connect_async(config.ws_url.as_str()).await {
            Ok((mut ws, _)) => {
                attempts = 0;
                let _ = connected.send(true);
                tracing::info!(url = %config.ws_url, "connected");

                // No replay on reconnect: anything missed while
                // disconnected is only recoverable by re-fetching.
                refetch(&http, &config.http_url, &records).await;

                loop {
                    match ws.next().await {
                        Some(Ok(Message::Text(_))) => {
                            // Payload deliberately discarded.
                            refetch(&http, &config.http_url, &records).await;
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }

                let _ = connected.send(false);
                tracing::info!("disconnected");
            }
            Err(e) => {
                tracing::warn!(error = %e, "connect failed");
            }
        }

        attempts += 1;
        if attempts > config.reconnect_attempts {
            tracing::error!(attempts, "giving up on reconnect");
            return;
        }
        tokio::time::sleep(config.reconnect_delay).await;
    }
}

/// Replace the local view with the server's current collection.
/// Failures are logged and the previous view is kept.
async fn refetch(http: &reqwest::Client, base: &str, records: &watch::Sender<Vec<Record>>) {
    match fetch_all(http, base).await {
        Ok(list) => {
            let _ = records.send(list);
        }
        Err(e) => tracing::warn!(error = %e, "fetch records failed"),
    }
}

async fn fetch_all(http: &reqwest::Client, base: &str) -> Result<Vec<Record>, reqwest::Error> {
    http.get(format!("{base}/records"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

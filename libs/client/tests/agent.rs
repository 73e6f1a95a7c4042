//! Sync-agent contract tests against a real server: fetch on startup,
//! re-fetch on notification, connectivity surfaced as a boolean.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use recsync_api_server::{AppState, cors_layer, serve};
use recsync_client::{SyncAgent, SyncAgentConfig};
use recsync_engine::{ConnectionRegistry, NotificationBus, RecordService};
use recsync_store::SqliteStore;

const WAIT: Duration = Duration::from_secs(5);

struct TestServer {
    base: String,
    ws_url: String,
    shutdown: CancellationToken,
}

async fn start_server() -> TestServer {
    let store = SqliteStore::connect("sqlite::memory:", 1, Duration::from_secs(5))
        .await
        .unwrap();
    store.init_schema().await.unwrap();

    let registry = Arc::new(ConnectionRegistry::new(64));
    let bus = Arc::new(NotificationBus::new(registry.clone()));
    let service = Arc::new(RecordService::new(Arc::new(store), bus));
    let shutdown = CancellationToken::new();
    let state = AppState { service, registry, shutdown: shutdown.clone() };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cors = cors_layer(&["*".to_string()]).unwrap();

    tokio::spawn(async move {
        let _ = serve(listener, state, cors).await;
    });

    TestServer {
        base: format!("http://{addr}"),
        ws_url: format!("ws://{addr}/ws"),
        shutdown,
    }
}

fn agent_for(server: &TestServer) -> SyncAgent {
    let mut config = SyncAgentConfig::new(server.base.clone(), server.ws_url.clone());
    config.reconnect_delay = Duration::from_millis(100);
    SyncAgent::spawn(config)
}

#[tokio::test]
async fn agent_connects_and_fetches_initial_state() {
    let server = start_server().await;

    // Seed one record before the agent exists: no event will ever
    // announce it, only the startup fetch can see it.
    let client = reqwest::Client::new();
    client
        .post(format!("{}/records", server.base))
        .json(&serde_json::json!({ "name": "Alice" }))
        .send()
        .await
        .unwrap();

    let agent = agent_for(&server);

    let mut connected = agent.connected();
    tokio::time::timeout(WAIT, connected.wait_for(|c| *c))
        .await
        .unwrap()
        .unwrap();

    let mut records = agent.records();
    let view = tokio::time::timeout(
        WAIT,
        records.wait_for(|r| r.iter().any(|rec| rec.name == "Alice")),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(view.len(), 1);
}

#[tokio::test]
async fn agent_refetches_on_change_notification() {
    let server = start_server().await;
    let agent = agent_for(&server);

    let mut connected = agent.connected();
    tokio::time::timeout(WAIT, connected.wait_for(|c| *c))
        .await
        .unwrap()
        .unwrap();

    let client = reqwest::Client::new();
    let created: serde_json::Value = client
        .post(format!("{}/records", server.base))
        .json(&serde_json::json!({ "name": "Bob" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let mut records = agent.records();
    tokio::time::timeout(
        WAIT,
        records.wait_for(|r| r.iter().any(|rec| rec.id == id && rec.name == "Bob")),
    )
    .await
    .unwrap()
    .unwrap();

    // Delete propagates the same way.
    client
        .delete(format!("{}/records/{id}", server.base))
        .send()
        .await
        .unwrap();
    tokio::time::timeout(WAIT, records.wait_for(|r| r.is_empty()))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn agent_reports_disconnect_as_status_not_failure() {
    let server = start_server().await;
    let agent = agent_for(&server);

    let mut connected = agent.connected();
    tokio::time::timeout(WAIT, connected.wait_for(|c| *c))
        .await
        .unwrap()
        .unwrap();

    server.shutdown.cancel();

    tokio::time::timeout(WAIT, connected.wait_for(|c| !*c))
        .await
        .unwrap()
        .unwrap();
}

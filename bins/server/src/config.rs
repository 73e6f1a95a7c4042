use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "recsync-server", about = "Live-synchronized record store server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the REST + WebSocket server
    Serve(ServeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Path to the TOML config file
    #[arg(long, default_value = "recsync.toml", env = "CONFIG_PATH")]
    pub config: String,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Store connection URL. `mode=rwc` creates the file on first run.
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Allowed cross-origin callers; `"*"` opens the API to any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Per-subscriber event buffer; a client further behind loses events.
    #[serde(default = "default_ws_buffer")]
    pub ws_buffer: usize,
    #[serde(default = "default_store_max_connections")]
    pub store_max_connections: u32,
    /// Bound on waiting for a store connection before the request
    /// fails instead of hanging.
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,
}

fn default_api_port() -> u16 {
    3000
}
fn default_database_url() -> String {
    "sqlite://records.db?mode=rwc".into()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}
fn default_ws_buffer() -> usize {
    64
}
fn default_store_max_connections() -> u32 {
    5
}
fn default_store_timeout_secs() -> u64 {
    5
}

impl ServerConfig {
    /// Load from TOML. A missing file is not an error — every field
    /// has a default and the server runs without any config at all.
    pub fn load(path: &str) -> Result<Self, crate::error::ServerError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(config = %path, "config file not found, using defaults");
                String::new()
            }
            Err(e) => {
                return Err(crate::error::ServerError::Config {
                    context: "read",
                    detail: format!("'{path}': {e}"),
                });
            }
        };
        toml::from_str(&content).map_err(|e| crate::error::ServerError::Config {
            context: "parse",
            detail: format!("'{path}': {e}"),
        })
    }
}

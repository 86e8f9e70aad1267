//! Room-scoped WebSocket relay.
//!
//! Authenticates each connection against the identity service, then relays
//! `action` / `chat` frames to every other member of the client's room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin jigger-server
//! cargo run --bin jigger-server -- --host 0.0.0.0 --port 8765 --auth-url http://auth:8080/auth/check-token
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use jigger_server::{
    config::{AuthConfig, RelayConfig, SessionConfig, optional_secs},
    infrastructure::{
        auth::HttpAuthVerifier, catalog::StaticCatalog, registry::InMemoryRoomRegistry,
    },
    ui::{AppState, Server},
};
use jigger_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "jigger-server")]
#[command(about = "Room-scoped WebSocket relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "JIGGER_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "JIGGER_PORT", default_value = "8765")]
    port: u16,

    /// Token verification endpoint of the identity service
    #[arg(
        long,
        env = "JIGGER_AUTH_URL",
        default_value = "http://localhost:8080/auth/check-token"
    )]
    auth_url: String,

    /// Application identifier sent with every verification
    #[arg(long, env = "JIGGER_APP_ID", default_value = "desktop_app")]
    app_id: String,

    /// Shared secret sent as X-Internal-Auth
    #[arg(long, env = "JIGGER_INTERNAL_API_KEY")]
    internal_api_key: Option<String>,

    /// Verification timeout in milliseconds
    #[arg(long, default_value = "5000")]
    auth_timeout_ms: u64,

    /// How long a new connection may take to send its handshake, in milliseconds
    #[arg(long, default_value = "10000")]
    handshake_timeout_ms: u64,

    /// Close sessions silent for this many seconds (0 disables)
    #[arg(long, default_value = "0")]
    idle_timeout_secs: u64,

    /// Ping interval in seconds (0 disables)
    #[arg(long, default_value = "0")]
    ping_interval_secs: u64,

    /// Per-connection outbound queue capacity
    #[arg(long, default_value = "256")]
    outbound_buffer: usize,

    /// Re-verify tokens carried by application messages
    #[arg(long)]
    reverify_tokens: bool,

    /// Evict earlier sessions of an identity when it joins again
    #[arg(long)]
    evict_duplicate_identity: bool,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            auth: AuthConfig {
                endpoint: args.auth_url,
                app_id: args.app_id,
                internal_api_key: args.internal_api_key.filter(|key| !key.is_empty()),
                timeout: Duration::from_millis(args.auth_timeout_ms),
            },
            session: SessionConfig {
                handshake_timeout: Duration::from_millis(args.handshake_timeout_ms),
                idle_timeout: optional_secs(args.idle_timeout_secs),
                ping_interval: optional_secs(args.ping_interval_secs),
                outbound_buffer: args.outbound_buffer,
                reverify_tokens: args.reverify_tokens,
                evict_duplicate_identity: args.evict_duplicate_identity,
            },
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = RelayConfig::from(Args::parse());

    // Initialize dependencies in order:
    // 1. RoomRegistry
    // 2. AuthVerifier
    // 3. Catalog
    // 4. AppState (UseCases)
    // 5. Server

    // 1. Create RoomRegistry (in-memory, process lifetime)
    let registry = Arc::new(InMemoryRoomRegistry::new());

    // 2. Create AuthVerifier (HTTP identity service)
    let verifier = match HttpAuthVerifier::new(config.auth.clone()) {
        Ok(verifier) => Arc::new(verifier),
        Err(e) => {
            tracing::error!("Failed to build identity service client: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Verifying tokens against {}", config.auth.endpoint);

    // 3. Create Catalog
    let catalog = Arc::new(StaticCatalog::demo());

    // 4. Create AppState
    let state = AppState::new(&config, verifier, registry, catalog);

    // 5. Create and run the server
    let server = Server::new(state);
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

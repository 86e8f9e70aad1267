//! Interactive client for the room relay.
//!
//! Authenticates with a platform token, joins a room and sends each line typed
//! at the prompt as a `chat` message. Slash commands: `/rooms`, `/backpack`,
//! `/market`, `/action [name]`.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second
//! interval). A rejected token is never retried.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin jigger-client -- --token <TOKEN> --identity <OPENID> --room lobby
//! JIGGER_TOKEN=<TOKEN> cargo run --bin jigger-client -- -i <OPENID>
//! ```

use clap::Parser;

use jigger_client::{ClientConfig, run_client};
use jigger_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "jigger-client")]
#[command(about = "Interactive client for the room relay", long_about = None)]
struct Args {
    /// Platform token issued by the identity service
    #[arg(short = 't', long, env = "JIGGER_TOKEN")]
    token: String,

    /// Identity (openid) the token was issued to
    #[arg(short = 'i', long, env = "JIGGER_IDENTITY")]
    identity: String,

    /// Room to join
    #[arg(short = 'r', long, default_value = "lobby")]
    room: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, env = "JIGGER_URL", default_value = "ws://127.0.0.1:8765/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = ClientConfig {
        url: args.url,
        token: args.token,
        identity: args.identity,
        room: args.room,
    };

    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

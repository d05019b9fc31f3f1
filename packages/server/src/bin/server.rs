//! WebSocket chat broker with room-scoped fan-out.
//!
//! Clients join over one WebSocket connection each; the broker routes chat
//! messages, attachments, and private messages, and broadcasts presence.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin idobata-server
//! cargo run --bin idobata-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;

use idobata_server::{
    infrastructure::message_pusher::WebSocketMessagePusher,
    ui::Server,
    usecase::{BrokerConfig, MessageRouter},
};
use idobata_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "idobata-server")]
#[command(about = "Room-scoped WebSocket chat broker", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Messages kept per room for history replay
    #[arg(long, default_value_t = idobata_server::domain::DEFAULT_HISTORY_CAPACITY)]
    history_capacity: usize,

    /// Maximum attachment payload size in bytes
    #[arg(long, default_value_t = idobata_server::usecase::router::DEFAULT_MAX_ATTACHMENT_BYTES)]
    max_attachment_bytes: usize,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. MessagePusher (outbound transport)
    // 2. MessageRouter (the broker, one instance per process)
    // 3. Server

    let pusher = Arc::new(WebSocketMessagePusher::new());
    let config = BrokerConfig {
        history_capacity: args.history_capacity,
        max_attachment_bytes: args.max_attachment_bytes,
    };
    let router = Arc::new(MessageRouter::new(pusher, Arc::new(SystemClock), config));
    let server = Server::new(router);

    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

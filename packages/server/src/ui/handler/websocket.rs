//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{domain::ConnectionId, infrastructure::dto::websocket::ClientEvent, ui::state::AppState};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives frames from the rx channel and pushes them to
/// the WebSocket sender.
///
/// This is the only place the broker's outbound frames touch socket I/O; the
/// broker itself just writes to the channel.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            // Send the frame to this client
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // The transport assigns the connection id; the broker only references it
    let connection_id = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    state.router.connect(connection_id.clone(), tx).await;

    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    let router = state.router.clone();
    let conn = connection_id.clone();

    // Receive frames from this client and hand them to the router
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", conn, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received frame from '{}': {}", conn, text);
                    match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => router.handle_event(&conn, event).await,
                        Err(e) => {
                            // Malformed frames are dropped; nothing is sent
                            // back and other connections are unaffected
                            tracing::warn!(
                                "Dropping malformed frame from '{}': {}",
                                conn,
                                e
                            );
                        }
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping from '{}'", conn);
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", conn);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // A dropped transport is an implicit disconnect: same cleanup as an
    // explicit one, idempotent either way
    state.router.disconnect(&connection_id).await;
    tracing::info!("Connection '{}' closed", connection_id);
}

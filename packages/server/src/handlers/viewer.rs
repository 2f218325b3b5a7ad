use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::broadcast::ClientEvent;
use crate::state::AppState;

/// Upgrade to the viewer channel. Public; no token required.
pub async fn viewer_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (session_id, mut rx) = state.viewers.register();
    info!(%session_id, viewers = state.viewers.len(), "Viewer connected");

    // Outgoing events. Ends when the session is deregistered or the registry
    // is cleared, then closes the socket.
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(event.as_ref()) {
                Ok(text) => text,
                Err(e) => {
                    error!(event = event.name(), error = %e, "Failed to encode viewer event");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    state.broadcaster.greet(session_id).await;

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => {
                    state
                        .broadcaster
                        .handle_client_event(session_id, event)
                        .await
                }
                Err(e) => debug!(%session_id, error = %e, "Ignoring unrecognised viewer message"),
            },
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!(%session_id, error = %e, "Viewer socket error");
                break;
            }
            _ => {}
        }
    }

    // Dropping the session's sender also stops the writer task.
    state.viewers.deregister(session_id);
    info!(%session_id, viewers = state.viewers.len(), "Viewer disconnected");
}

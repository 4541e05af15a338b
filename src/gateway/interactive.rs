//! WebSocket transport for interactive sessions

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{future, SinkExt, StreamExt};
use std::pin::pin;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::gateway::protocol::{ClientMessage, ServerMessage};
use crate::gateway::session::InteractiveSession;
use crate::gateway::AppState;

const OUTBOUND_CAPACITY: usize = 64;

/// `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection = Uuid::new_v4();
    info!("Interactive client {} connected", connection);

    let (mut sender, receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(OUTBOUND_CAPACITY);

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sender
                .send(Message::Text(message.to_json().into()))
                .await
                .is_err()
            {
                break;
            }
        }
        let _ = sender.close().await;
    });

    // A close frame or transport error ends the session like a disconnect
    let inbound = receiver
        .take_while(|frame| future::ready(matches!(frame, Ok(m) if !matches!(m, Message::Close(_)))))
        .filter_map(|frame| {
            future::ready(match frame {
                Ok(Message::Text(text)) => Some(ClientMessage::parse(text.as_str())),
                Ok(other) => {
                    debug!("Ignoring non-text frame: {:?}", other);
                    None
                }
                Err(_) => None,
            })
        });
    let inbound = pin!(inbound);

    let phase = InteractiveSession::new(state.controller, tx).run(inbound).await;

    let _ = writer.await;
    info!("Interactive client {} disconnected ({})", connection, phase);
}

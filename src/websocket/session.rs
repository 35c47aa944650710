//! WebSocket Session
//!
//! Handles the WebSocket upgrade and drives one connection from accept to
//! teardown.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::hub::ConnectionHub;
use super::messages::{ClientMessage, ServerMessage};
use crate::api::AppState;

/// WebSocket upgrade handler
///
/// This is the entry point for WebSocket connections.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, hub: Arc<ConnectionHub>) {
    let (mut sender, mut receiver) = socket.split();

    // Create channel for sending messages to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let session_id = match hub.register(tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting WebSocket connection");
            if let Ok(text) = serde_json::to_string(&ServerMessage::error(e.to_string())) {
                let _ = sender.send(Message::Text(text)).await;
            }
            let _ = sender.close().await;
            return;
        }
    };

    // Queued ahead of anything else the session will receive
    let _ = hub
        .send_to(&session_id, ServerMessage::connection_established(&session_id))
        .await;

    let id_for_send = session_id.clone();

    // Task to forward messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        tracing::debug!(
                            session_id = %id_for_send,
                            "WebSocket send failed, closing connection"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize message");
                }
            }
        }
    });

    let hub_for_recv = Arc::clone(&hub);
    let id_for_recv = session_id.clone();

    // Task to receive messages from WebSocket and handle them
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&hub_for_recv, &id_for_recv, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        session_id = %id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    // Whichever half stops first ends the session
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    // Single teardown point for close, error and send failure
    hub.unregister(&session_id).await;
}

/// Handle a received WebSocket frame
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(hub: &ConnectionHub, session_id: &str, message: Message) -> bool {
    match message {
        Message::Text(text) => {
            handle_text(hub, session_id, &text).await;
            true
        }
        // Some clients send JSON in binary frames
        Message::Binary(data) => {
            match std::str::from_utf8(&data) {
                Ok(text) => handle_text(hub, session_id, text).await,
                Err(_) => {
                    reply(hub, session_id, ServerMessage::error("Invalid message format")).await
                }
            }
            true
        }
        // Axum answers protocol pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(session_id = %session_id, "Client requested close");
            false
        }
    }
}

/// Parse one text frame and act on it. A malformed frame never ends the
/// session.
pub(crate) async fn handle_text(hub: &ConnectionHub, session_id: &str, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => handle_client_message(hub, session_id, message).await,
        Err(e) => {
            tracing::debug!(
                session_id = %session_id,
                error = %e,
                "Invalid client message"
            );
            reply(hub, session_id, ServerMessage::error("Invalid message format")).await;
        }
    }
}

async fn handle_client_message(hub: &ConnectionHub, session_id: &str, message: ClientMessage) {
    let response = match message {
        ClientMessage::SubscribeTopic { topic_id } => {
            match topic_id.filter(|t| !t.trim().is_empty()) {
                Some(topic_id) => match hub.switch_topic(session_id, &topic_id).await {
                    Ok(_) => ServerMessage::topic_subscribed(&topic_id),
                    Err(e) => ServerMessage::error(e.to_string()),
                },
                None => ServerMessage::error("Topic ID is required for subscription"),
            }
        }
        ClientMessage::UnsubscribeTopic { topic_id } => {
            let requested = topic_id.filter(|t| !t.trim().is_empty());
            match hub.leave_topic(session_id, requested.as_deref()).await {
                Ok(left) => ServerMessage::topic_unsubscribed(requested.or(left)),
                Err(e) => ServerMessage::error(e.to_string()),
            }
        }
        ClientMessage::Ping => ServerMessage::pong(),
        ClientMessage::Unknown => ServerMessage::error("Unknown message type"),
    };

    reply(hub, session_id, response).await;
}

async fn reply(hub: &ConnectionHub, session_id: &str, message: ServerMessage) {
    if let Err(e) = hub.send_to(session_id, message).await {
        tracing::debug!(session_id = %session_id, error = %e, "Reply dropped");
    }
}

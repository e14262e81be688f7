//! WebSocket route handler.
//!
//! Handles the upgrade, per-connection ticket authentication, forwarding of
//! bus events and dispatch of incoming player commands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, warn};

use super::connection::{ConnectionId, OutgoingMessage};
use crate::events::{Envelope, Event};
use crate::playback::{dispatch, IncomingMessage, PlayerError};
use crate::server::state::ServerState;

pub const WS_PROTOCOL: &str = "player";

/// Route handler for `GET /echo`.
///
/// No session is needed to upgrade. Each connection proves it belongs to a
/// session by presenting a ticket with its first message.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    ws.protocols([WS_PROTOCOL])
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: ServerState) {
    let (connection_id, outgoing_rx) = state.ws_connection_manager.register().await;
    let authenticated = Arc::new(AtomicBool::new(state.config.bypass_auth));
    debug!("WebSocket connected: {}", connection_id);

    let (ws_sink, ws_stream) = socket.split();

    // Subscribe before reading anything so no event published afterwards is missed
    let bus_rx = state.event_bus.subscribe();
    let outgoing_handle = tokio::spawn(forward_outgoing(
        ws_sink,
        outgoing_rx,
        bus_rx,
        authenticated.clone(),
    ));

    process_incoming(ws_stream, connection_id, &authenticated, &state).await;

    debug!("WebSocket disconnected: {}", connection_id);
    outgoing_handle.abort();
    state.ws_connection_manager.unregister(connection_id).await;
}

async fn send_event(
    ws_sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    event: &Event,
) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => ws_sink.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            error!("Failed to serialize WebSocket event: {}", e);
            true
        }
    }
}

/// Write direct replies and, once authenticated, every bus event.
async fn forward_outgoing(
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut outgoing_rx: mpsc::Receiver<OutgoingMessage>,
    mut bus_rx: broadcast::Receiver<Envelope>,
    authenticated: Arc<AtomicBool>,
) {
    loop {
        tokio::select! {
            message = outgoing_rx.recv() => match message {
                Some(OutgoingMessage::Event(event)) => {
                    if !send_event(&mut ws_sink, &event).await {
                        break;
                    }
                }
                Some(OutgoingMessage::Close) | None => {
                    let _ = ws_sink.send(Message::Close(None)).await;
                    break;
                }
            },
            received = bus_rx.recv() => match received {
                Ok(envelope) => {
                    if authenticated.load(Ordering::Acquire)
                        && !send_event(&mut ws_sink, &envelope.event).await
                    {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("WebSocket client lagging, {} events skipped", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

async fn process_incoming(
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    connection_id: ConnectionId,
    authenticated: &AtomicBool,
    state: &ServerState,
) {
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                handle_text(connection_id, text.as_str(), authenticated, state).await;
            }
            Ok(Message::Binary(_)) => {
                debug!("Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                debug!("Received close frame");
                break;
            }
            Err(e) => {
                debug!("WebSocket error: {}", e);
                break;
            }
        }
    }
}

async fn handle_text(
    connection_id: ConnectionId,
    text: &str,
    authenticated: &AtomicBool,
    state: &ServerState,
) {
    let message = match serde_json::from_str::<IncomingMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            debug!("Failed to parse client message: {}", e);
            return;
        }
    };

    if !authenticated.load(Ordering::Acquire) {
        let valid_ticket = message
            .auth_ticket
            .as_deref()
            .is_some_and(|ticket| state.pairing.consume_ws_ticket(ticket));
        if !valid_ticket {
            debug!("Unauthenticated message on connection {}", connection_id);
            let _ = state
                .ws_connection_manager
                .send_to(connection_id, Event::forbidden(text))
                .await;
            return;
        }
        authenticated.store(true, Ordering::Release);
        debug!("Connection {} authenticated", connection_id);
    }

    match dispatch(
        &state.player,
        &state.event_bus,
        &state.config.features,
        &message,
    )
    .await
    {
        Ok(true) => {}
        Ok(false) => debug!("Command {} rejected", message.message),
        Err(PlayerError::UnknownCommand(name)) => debug!("Unknown command {}", name),
        Err(e) => error!("Failed to dispatch {}: {}", message.message, e),
    }
}

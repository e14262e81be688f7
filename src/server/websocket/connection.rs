//! WebSocket connection manager.
//!
//! Tracks every open connection and holds a direct-reply channel for each,
//! used for messages meant for one client only and for closing connections
//! on shutdown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::events::Event;

pub type ConnectionId = u64;

const OUTGOING_BUFFER: usize = 32;

/// Something to write on one connection.
#[derive(Clone, Debug, PartialEq)]
pub enum OutgoingMessage {
    Event(Event),
    Close,
}

/// Error type for send operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SendError {
    /// No connection with this id.
    NotConnected,
    /// The connection channel is closed (client disconnected).
    Disconnected,
}

pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, mpsc::Sender<OutgoingMessage>>>,
    next_id: AtomicU64,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new connection.
    ///
    /// Returns its id and the receiver for outgoing messages, which the
    /// caller forwards to the socket.
    pub async fn register(&self) -> (ConnectionId, mpsc::Receiver<OutgoingMessage>) {
        let (tx, rx) = mpsc::channel(OUTGOING_BUFFER);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections.write().await.insert(id, tx);
        debug!("Registered WebSocket connection {}", id);
        (id, rx)
    }

    pub async fn unregister(&self, id: ConnectionId) {
        if self.connections.write().await.remove(&id).is_some() {
            debug!("Unregistered WebSocket connection {}", id);
        }
    }

    /// Send an event to one connection only.
    pub async fn send_to(&self, id: ConnectionId, event: Event) -> Result<(), SendError> {
        let sender = self
            .connections
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SendError::NotConnected)?;
        sender
            .send(OutgoingMessage::Event(event))
            .await
            .map_err(|_| SendError::Disconnected)
    }

    /// Ask every connection to close and forget about them.
    pub async fn close_all(&self) -> usize {
        let connections: Vec<_> = self.connections.write().await.drain().collect();
        for (id, sender) in &connections {
            if sender.send(OutgoingMessage::Close).await.is_err() {
                debug!("Connection {} already gone", id);
            }
        }
        connections.len()
    }

    pub async fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.read().await.contains_key(&id)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

//! WebSocket delivery of player events and intake of player commands.

mod connection;
mod handler;

pub use connection::{ConnectionId, ConnectionManager, OutgoingMessage, SendError};
pub use handler::{ws_handler, WS_PROTOCOL};

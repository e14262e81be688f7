//! Event model and the bus that delivers it to WebSocket and long-poll clients.

mod bus;
mod event;

pub use bus::{Envelope, EventBus};
pub use event::{Event, NowPlaying, WsBookmark, WsChapter};

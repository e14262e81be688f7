//! Remote Access Gateway Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod browser;
pub mod config;
pub mod download;
pub mod events;
pub mod items;
pub mod library;
pub mod pairing;
pub mod playback;
pub mod server;

// Re-export commonly used types for convenience
pub use events::{Event, EventBus};
pub use library::{InMemoryLibrary, MediaLibrary};
pub use pairing::PairingManager;
pub use playback::{LocalPlayer, PlayerHandle};
pub use server::{make_app, run_server, serve, RequestsLoggingLevel, ServerConfig};

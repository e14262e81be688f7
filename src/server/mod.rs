mod artwork;
mod browse_routes;
pub mod config;
mod download_routes;
mod http_layers;
mod library_routes;
mod pairing_routes;
mod playback_routes;
pub mod server;
pub mod session;
pub mod state;
#[cfg(test)]
pub(crate) mod test_support;
mod upload_routes;
pub mod websocket;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server, serve};

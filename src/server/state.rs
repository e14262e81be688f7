use axum::extract::FromRef;

use crate::download::DownloadPackager;
use crate::events::EventBus;
use crate::library::MediaLibrary;
use crate::pairing::PairingManager;
use crate::playback::PlayerHandle;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::websocket::ConnectionManager;
use super::ServerConfig;

pub type GuardedLibrary = Arc<dyn MediaLibrary>;
pub type GuardedPairingManager = Arc<PairingManager>;
pub type GuardedConnectionManager = Arc<ConnectionManager>;
pub type GuardedPackager = Arc<DownloadPackager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub library: GuardedLibrary,
    pub pairing: GuardedPairingManager,
    pub event_bus: EventBus,
    pub player: PlayerHandle,
    pub ws_connection_manager: GuardedConnectionManager,
    pub packager: GuardedPackager,
    pub http_client: reqwest::Client,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        pairing: PairingManager,
        library: GuardedLibrary,
        event_bus: EventBus,
        player: PlayerHandle,
        download_dir: PathBuf,
    ) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            hash: env!("GIT_HASH").to_owned(),
            packager: Arc::new(DownloadPackager::new(library.clone(), download_dir)),
            library,
            pairing: Arc::new(pairing),
            event_bus,
            player,
            ws_connection_manager: Arc::new(ConnectionManager::new()),
            http_client: reqwest::Client::new(),
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedLibrary {
    fn from_ref(input: &ServerState) -> Self {
        input.library.clone()
    }
}

impl FromRef<ServerState> for GuardedPairingManager {
    fn from_ref(input: &ServerState) -> Self {
        input.pairing.clone()
    }
}

impl FromRef<ServerState> for EventBus {
    fn from_ref(input: &ServerState) -> Self {
        input.event_bus.clone()
    }
}

impl FromRef<ServerState> for PlayerHandle {
    fn from_ref(input: &ServerState) -> Self {
        input.player.clone()
    }
}

impl FromRef<ServerState> for GuardedConnectionManager {
    fn from_ref(input: &ServerState) -> Self {
        input.ws_connection_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedPackager {
    fn from_ref(input: &ServerState) -> Self {
        input.packager.clone()
    }
}

//! State builders shared by router-level tests.

use std::path::PathBuf;
use std::sync::Arc;

use super::state::ServerState;
use super::ServerConfig;
use crate::config::{EventSettings, FeatureFlags, PairingSettings};
use crate::events::EventBus;
use crate::library::InMemoryLibrary;
use crate::pairing::PairingManager;
use crate::playback::{LocalPlayer, PlayerHandle};

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gateway-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Default configuration and an empty library.
pub fn test_state() -> ServerState {
    test_state_with(ServerConfig::default(), InMemoryLibrary::new())
}

/// Every feature on, authentication bypassed.
pub fn open_config() -> ServerConfig {
    ServerConfig {
        bypass_auth: true,
        features: FeatureFlags::all(),
        ..Default::default()
    }
}

pub fn test_state_with(config: ServerConfig, library: InMemoryLibrary) -> ServerState {
    let event_bus = EventBus::new(EventSettings::default());
    let player = PlayerHandle::spawn(
        LocalPlayer::new(config.features.video_output),
        event_bus.clone(),
    );
    ServerState::new(
        config,
        PairingManager::new(PairingSettings::default()),
        Arc::new(library),
        event_bus,
        player,
        scratch_dir(),
    )
}

//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own media tree, player and
//! pairing state.

use super::constants::*;
use super::fixtures::create_test_library;
use remote_access_gateway::config::{
    BrowserSettings, EventSettings, FeatureFlags, PairingSettings, Timeouts,
};
use remote_access_gateway::server::state::ServerState;
use remote_access_gateway::{
    serve, EventBus, LocalPlayer, PairingManager, PlayerHandle, RequestsLoggingLevel,
    ServerConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated media library
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Shared state, for driving the pairing manager or the bus directly
    pub state: ServerState,

    /// Root of the fixture media tree, also the only configured storage
    pub media_root: PathBuf,

    // Private fields - keep resources alive until drop
    _temp_media_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server with every feature enabled and authentication required
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawns a server after letting the test adjust its configuration
    ///
    /// This function:
    /// 1. Creates a temporary media tree and its library
    /// 2. Starts the player control loop
    /// 3. Binds to a random port (127.0.0.1:0)
    /// 4. Spawns the server in a background task
    /// 5. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if the fixtures cannot be written, the port cannot be bound
    /// or the server doesn't become ready within timeout.
    pub async fn spawn_with(configure: impl FnOnce(&mut ServerConfig)) -> Self {
        let (temp_media_dir, library) =
            create_test_library().expect("Failed to create test library");
        let media_root = temp_media_dir.path().to_path_buf();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            artwork_cache_age_sec: 0,
            features: FeatureFlags::all(),
            timeouts: Timeouts {
                long_poll: Duration::from_millis(LONG_POLL_TIMEOUT_MS),
                ..Default::default()
            },
            browser: BrowserSettings {
                storages: vec![media_root.clone()],
                ..Default::default()
            },
            upload_dir: media_root.join("uploads"),
            ..Default::default()
        };
        configure(&mut config);

        let event_bus = EventBus::new(EventSettings::default());
        let player = PlayerHandle::spawn(
            LocalPlayer::new(config.features.video_output),
            event_bus.clone(),
        );
        let state = ServerState::new(
            config,
            PairingManager::new(PairingSettings::default()),
            Arc::new(library),
            event_bus,
            player,
            media_root.join("downloads"),
        );

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        // Spawn server in background task with graceful shutdown
        let server_state = state.clone();
        tokio::spawn(async move {
            serve(listener, server_state, async move {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            state,
            media_root,
            _temp_media_dir: temp_media_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// The code the player would currently show on its screen
    pub fn displayed_code(&self) -> Option<String> {
        self.state.pairing.display_updates().borrow().clone()
    }

    /// Waits for the server to become ready by polling the home route
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            if let Ok(response) = client.get(format!("{}/", self.base_url)).send().await {
                if response.status().is_success() {
                    return;
                }
            }

            tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::sync::{Arc, Mutex};
use std::{
    fmt::Debug,
    path::{Path, PathBuf},
};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use remote_access_gateway::config::{AppConfig, CliConfig, FileConfig};
use remote_access_gateway::download::server_log_name;
use remote_access_gateway::server::state::ServerState;
use remote_access_gateway::{
    run_server, EventBus, InMemoryLibrary, LocalPlayer, MediaLibrary, PairingManager,
    PlayerHandle, RequestsLoggingLevel, ServerConfig,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// The port to listen on.
    #[clap(short, long, default_value_t = 8080)]
    pub port: u16,

    /// The address to bind, reachable by the remote devices.
    #[clap(long, default_value = "0.0.0.0")]
    pub bind_address: String,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Directory scanned to build the media library.
    #[clap(long, value_parser = parse_path)]
    pub media_dir: Option<PathBuf>,

    /// Directory where download artifacts are prepared.
    #[clap(long, value_parser = parse_path)]
    pub download_dir: Option<PathBuf>,

    /// Accept every request as paired. Only meant for development.
    #[clap(long)]
    pub bypass_auth: bool,

    /// Optional TOML configuration file, its values override the arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            port: self.port,
            bind_address: self.bind_address.clone(),
            logging_level: self.logging_level.clone(),
            frontend_dir_path: self.frontend_dir_path.clone(),
            media_dir: self.media_dir.clone(),
            download_dir: self.download_dir.clone(),
            bypass_auth: self.bypass_auth,
        }
    }
}

fn load_library(config: &AppConfig) -> Result<Arc<dyn MediaLibrary>> {
    let library = match &config.media_dir {
        Some(dir) => InMemoryLibrary::scan(dir)?,
        None => {
            warn!("No media directory configured, the library is empty");
            InMemoryLibrary::new()
        }
    };
    info!("Library ready with {} media", library.media_count());
    Ok(Arc::new(library))
}

/// A fresh timestamped file in `dir` for this run's log.
fn open_log_file(dir: &Path) -> Result<File> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create log directory {:?}", dir))?;
    let path = dir.join(server_log_name(chrono::Local::now()));
    File::create(&path).with_context(|| format!("Cannot create log file {:?}", path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let log_file = match &app_config.log_dir {
        Some(dir) => Some(open_log_file(dir)?),
        None => None,
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(log_file.map(|file| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
        }))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    if let Some(path) = &cli_args.config {
        info!("Loaded configuration from {:?}", path);
    }
    info!("Features: {:?}", app_config.features);
    if app_config.bypass_auth {
        warn!("Authentication is bypassed, every client is trusted");
    }

    let library = load_library(&app_config)?;

    let event_bus = EventBus::new(app_config.events);
    let player = PlayerHandle::spawn(
        LocalPlayer::new(app_config.features.video_output),
        event_bus.clone(),
    );

    let pairing = PairingManager::new(app_config.pairing);
    let mut display = pairing.display_updates();
    tokio::spawn(async move {
        while display.changed().await.is_ok() {
            match display.borrow_and_update().clone() {
                Some(code) => info!("Pairing code: {}", code),
                None => info!("Pairing code cleared"),
            }
        }
    });

    let state = ServerState::new(
        ServerConfig::from(&app_config),
        pairing,
        library,
        event_bus,
        player,
        app_config.download_dir.clone(),
    );

    info!("Ready to serve at port {}!", app_config.port);
    run_server(state).await
}

mod file_config;

pub use file_config::{
    BrowserConfig, EventsConfig, FeaturesConfig, FileConfig, PairingConfig, TimeoutsConfig,
};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub port: u16,
    pub bind_address: String,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub media_dir: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
    pub bypass_auth: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub port: u16,
    pub bind_address: String,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub media_dir: Option<PathBuf>,
    pub download_dir: PathBuf,
    /// Where `/upload-media` stores received files.
    pub upload_dir: PathBuf,
    /// Log files are written here and offered by `/logfile-list` when set.
    pub log_dir: Option<PathBuf>,
    pub bypass_auth: bool,
    pub artwork_cache_age_sec: usize,

    // Sections (with defaults)
    pub features: FeatureFlags,
    pub timeouts: Timeouts,
    pub pairing: PairingSettings,
    pub events: EventSettings,
    pub browser: BrowserSettings,
}

/// Per-route-family switches. A disabled family answers 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub videos: bool,
    pub audio: bool,
    pub playlists: bool,
    pub search: bool,
    pub file_browser: bool,
    pub network_browser: bool,
    pub history: bool,
    pub playback_control: bool,
    pub video_output: bool,
    /// Log file listing and download.
    pub logs: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            videos: true,
            audio: true,
            playlists: true,
            search: true,
            file_browser: false,
            network_browser: false,
            history: false,
            playback_control: true,
            video_output: true,
            logs: false,
        }
    }
}

impl FeatureFlags {
    /// Everything on, handy for tests and local development.
    pub fn all() -> Self {
        Self {
            file_browser: true,
            network_browser: true,
            history: true,
            logs: true,
            ..Self::default()
        }
    }
}

/// Bounded waits used by the long-poll and aggregation routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub long_poll: Duration,
    pub listing: Duration,
    pub deep_browse: Duration,
    pub describe: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            long_poll: Duration::from_millis(3000),
            listing: Duration::from_millis(2000),
            deep_browse: Duration::from_millis(20000),
            describe: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingSettings {
    pub code_ttl: Duration,
    pub session_ttl: Duration,
    pub ticket_ttl: Duration,
    /// Code requests and verifications allowed per client address, 0 for no limit.
    pub attempts_per_minute: u32,
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            code_ttl: Duration::from_secs(300),
            session_ttl: Duration::from_secs(3600 * 24 * 365),
            ticket_ttl: Duration::from_secs(60),
            attempts_per_minute: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSettings {
    pub queue_capacity: usize,
    pub broadcast_capacity: usize,
    pub coalesce_snapshots: bool,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            broadcast_capacity: 256,
            coalesce_snapshots: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserSettings {
    pub storages: Vec<PathBuf>,
    pub favorites: Vec<String>,
    pub network_shares: Vec<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let bind_address = file
            .bind_address
            .unwrap_or_else(|| cli.bind_address.clone());
        if bind_address.is_empty() {
            bail!("bind_address must not be empty");
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let media_dir = file
            .media_dir
            .map(PathBuf::from)
            .or_else(|| cli.media_dir.clone());
        if let Some(dir) = &media_dir {
            if !dir.exists() {
                bail!("Media directory does not exist: {:?}", dir);
            }
            if !dir.is_dir() {
                bail!("media_dir is not a directory: {:?}", dir);
            }
        }

        let download_dir = file
            .download_dir
            .map(PathBuf::from)
            .or_else(|| cli.download_dir.clone())
            .unwrap_or_else(|| std::env::temp_dir().join("remote-access-downloads"));

        let upload_dir = match (file.upload_dir, &media_dir) {
            (Some(dir), _) => PathBuf::from(dir),
            (None, Some(media_dir)) => media_dir.join("uploads"),
            (None, None) => std::env::temp_dir().join("remote-access-uploads"),
        };
        let log_dir = file.log_dir.map(PathBuf::from);

        let bypass_auth = file.bypass_auth.unwrap_or(cli.bypass_auth);
        let artwork_cache_age_sec = file.artwork_cache_age_sec.unwrap_or(3600);

        let defaults = FeatureFlags::default();
        let f = file.features.unwrap_or_default();
        let features = FeatureFlags {
            videos: f.videos.unwrap_or(defaults.videos),
            audio: f.audio.unwrap_or(defaults.audio),
            playlists: f.playlists.unwrap_or(defaults.playlists),
            search: f.search.unwrap_or(defaults.search),
            file_browser: f.file_browser.unwrap_or(defaults.file_browser),
            network_browser: f.network_browser.unwrap_or(defaults.network_browser),
            history: f.history.unwrap_or(defaults.history),
            playback_control: f.playback_control.unwrap_or(defaults.playback_control),
            video_output: f.video_output.unwrap_or(defaults.video_output),
            logs: f.logs.unwrap_or(defaults.logs),
        };

        let defaults = Timeouts::default();
        let t = file.timeouts.unwrap_or_default();
        let timeouts = Timeouts {
            long_poll: millis_or(t.long_poll_ms, defaults.long_poll, "long_poll_ms")?,
            listing: millis_or(t.listing_ms, defaults.listing, "listing_ms")?,
            deep_browse: millis_or(t.deep_browse_ms, defaults.deep_browse, "deep_browse_ms")?,
            describe: millis_or(t.describe_ms, defaults.describe, "describe_ms")?,
        };

        let defaults = PairingSettings::default();
        let p = file.pairing.unwrap_or_default();
        let pairing = PairingSettings {
            code_ttl: p
                .code_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.code_ttl),
            session_ttl: p
                .session_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
            ticket_ttl: p
                .ticket_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.ticket_ttl),
            attempts_per_minute: p
                .attempts_per_minute
                .unwrap_or(defaults.attempts_per_minute),
        };

        let defaults = EventSettings::default();
        let e = file.events.unwrap_or_default();
        let events = EventSettings {
            queue_capacity: e.queue_capacity.unwrap_or(defaults.queue_capacity),
            broadcast_capacity: e.broadcast_capacity.unwrap_or(defaults.broadcast_capacity),
            coalesce_snapshots: e.coalesce_snapshots.unwrap_or(defaults.coalesce_snapshots),
        };
        if events.queue_capacity == 0 || events.broadcast_capacity == 0 {
            bail!("Event queue and broadcast capacities must be greater than zero");
        }

        let b = file.browser.unwrap_or_default();
        let storages = match b.storages {
            Some(storages) => storages.into_iter().map(PathBuf::from).collect(),
            None => media_dir.iter().cloned().collect(),
        };
        let browser = BrowserSettings {
            storages,
            favorites: b.favorites.unwrap_or_default(),
            network_shares: b.network_shares.unwrap_or_default(),
        };

        Ok(Self {
            port,
            bind_address,
            logging_level,
            frontend_dir_path,
            media_dir,
            download_dir,
            upload_dir,
            log_dir,
            bypass_auth,
            artwork_cache_age_sec,
            features,
            timeouts,
            pairing,
            events,
            browser,
        })
    }
}

fn millis_or(value: Option<u64>, default: Duration, name: &str) -> Result<Duration> {
    match value {
        Some(0) => bail!("{} must be greater than zero", name),
        Some(ms) => Ok(Duration::from_millis(ms)),
        None => Ok(default),
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

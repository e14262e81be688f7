use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub logging_level: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub media_dir: Option<String>,
    pub download_dir: Option<String>,
    pub upload_dir: Option<String>,
    pub log_dir: Option<String>,
    pub bypass_auth: Option<bool>,
    pub artwork_cache_age_sec: Option<usize>,

    // Sections
    pub features: Option<FeaturesConfig>,
    pub timeouts: Option<TimeoutsConfig>,
    pub pairing: Option<PairingConfig>,
    pub events: Option<EventsConfig>,
    pub browser: Option<BrowserConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct FeaturesConfig {
    pub videos: Option<bool>,
    pub audio: Option<bool>,
    pub playlists: Option<bool>,
    pub search: Option<bool>,
    pub file_browser: Option<bool>,
    pub network_browser: Option<bool>,
    pub history: Option<bool>,
    pub playback_control: Option<bool>,
    /// Whether the player can currently show video.
    pub video_output: Option<bool>,
    pub logs: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub long_poll_ms: Option<u64>,
    pub listing_ms: Option<u64>,
    pub deep_browse_ms: Option<u64>,
    pub describe_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct PairingConfig {
    pub code_ttl_secs: Option<u64>,
    pub session_ttl_secs: Option<u64>,
    pub ticket_ttl_secs: Option<u64>,
    pub attempts_per_minute: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct EventsConfig {
    pub queue_capacity: Option<usize>,
    pub broadcast_capacity: Option<usize>,
    pub coalesce_snapshots: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct BrowserConfig {
    /// Storage roots listed by /storage-list, as filesystem paths.
    pub storages: Option<Vec<String>>,
    /// Folders listed by /favorite-list, as filesystem paths or URIs.
    pub favorites: Option<Vec<String>>,
    /// Network share URIs reported by network discovery.
    pub network_shares: Option<Vec<String>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

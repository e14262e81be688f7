use super::RequestsLoggingLevel;
use crate::config::{AppConfig, BrowserSettings, FeatureFlags, Timeouts};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub bind_address: String,
    pub artwork_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    /// Every protected route acts as if a valid session was presented.
    pub bypass_auth: bool,
    pub session_cookie_max_age: Duration,
    /// Per client address on `/code` and `/verify-code`, 0 turns limiting off.
    pub pairing_attempts_per_minute: u32,
    pub features: FeatureFlags,
    pub timeouts: Timeouts,
    pub browser: BrowserSettings,
    pub upload_dir: PathBuf,
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 8080,
            bind_address: "127.0.0.1".to_string(),
            artwork_cache_age_sec: 3600,
            frontend_dir_path: None,
            bypass_auth: false,
            session_cookie_max_age: Duration::from_secs(3600 * 24 * 365),
            pairing_attempts_per_minute: 10,
            features: FeatureFlags::default(),
            timeouts: Timeouts::default(),
            browser: BrowserSettings::default(),
            upload_dir: std::env::temp_dir().join("remote-access-uploads"),
            log_dir: None,
        }
    }
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        ServerConfig {
            requests_logging_level: config.logging_level.clone(),
            port: config.port,
            bind_address: config.bind_address.clone(),
            artwork_cache_age_sec: config.artwork_cache_age_sec,
            frontend_dir_path: config.frontend_dir_path.clone(),
            bypass_auth: config.bypass_auth,
            session_cookie_max_age: config.pairing.session_ttl,
            pairing_attempts_per_minute: config.pairing.attempts_per_minute,
            features: config.features,
            timeouts: config.timeouts,
            browser: config.browser.clone(),
            upload_dir: config.upload_dir.clone(),
            log_dir: config.log_dir.clone(),
        }
    }
}

//! Media library abstraction.
//!
//! The gateway never owns the media database. It talks to it through the
//! synchronous [`MediaLibrary`] trait, keyed by numeric ids.

mod memory;
mod models;

pub use memory::InMemoryLibrary;
pub use models::*;

use std::path::{Path, PathBuf};

/// Entity type selector used by `type=` query parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemType {
    Media,
    Album,
    Artist,
    Genre,
    Playlist,
    VideoGroup,
    VideoFolder,
}

impl ItemType {
    /// Unknown or missing values fall back to a single media.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("album") => ItemType::Album,
            Some("artist") => ItemType::Artist,
            Some("genre") => ItemType::Genre,
            Some("playlist") => ItemType::Playlist,
            Some("video-group") => ItemType::VideoGroup,
            Some("video-folder") => ItemType::VideoFolder,
            _ => ItemType::Media,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Media => "media",
            ItemType::Album => "album",
            ItemType::Artist => "artist",
            ItemType::Genre => "genre",
            ItemType::Playlist => "playlist",
            ItemType::VideoGroup => "video-group",
            ItemType::VideoFolder => "video-folder",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryKind {
    /// Local media played recently.
    Local,
    /// Network streams opened recently.
    Network,
}

/// Synchronous query interface over the player's media library.
pub trait MediaLibrary: Send + Sync {
    // =========================================================================
    // Single entities
    // =========================================================================

    fn media(&self, id: i64) -> Option<Media>;

    /// Look up a media by its URI, used to give browsed files their library id.
    fn media_by_uri(&self, uri: &str) -> Option<Media>;

    fn album(&self, id: i64) -> Option<Album>;

    fn artist(&self, id: i64) -> Option<Artist>;

    fn genre(&self, id: i64) -> Option<Genre>;

    fn playlist(&self, id: i64) -> Option<Playlist>;

    fn video_folder(&self, id: i64) -> Option<VideoFolder>;

    fn video_group(&self, id: i64) -> Option<VideoGroup>;

    // =========================================================================
    // Listings
    // =========================================================================

    fn videos(&self) -> Vec<Media>;

    fn audio_tracks(&self) -> Vec<Media>;

    fn albums(&self) -> Vec<Album>;

    fn artists(&self) -> Vec<Artist>;

    fn genres(&self) -> Vec<Genre>;

    fn playlists(&self) -> Vec<Playlist>;

    fn video_folders(&self) -> Vec<VideoFolder>;

    fn video_groups(&self) -> Vec<VideoGroup>;

    /// Resolve a collection to its media. For artists the albums are filled too.
    /// A `Media` collection holds just that media.
    fn collection(&self, item_type: ItemType, id: i64) -> Option<CollectionContents>;

    fn search(&self, query: &str) -> SearchAggregate;

    fn history(&self, kind: HistoryKind) -> Vec<Media>;

    // =========================================================================
    // Mutations and files
    // =========================================================================

    /// Returns false when the entity does not exist.
    fn set_favorite(&self, item_type: ItemType, id: i64, favorite: bool) -> bool;

    /// Create an empty playlist. `None` when the name is already taken.
    fn create_playlist(&self, name: &str) -> Option<i64>;

    /// Append media to a playlist. Returns false when the playlist does not exist.
    fn add_to_playlist(&self, playlist_id: i64, media_ids: &[i64]) -> bool;

    /// Path of a locally stored artwork for the given entity.
    fn artwork(&self, item_type: ItemType, id: i64) -> Option<PathBuf>;
}

/// Coarse file classification by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileCategory {
    Audio,
    Video,
    Subtitle,
    Playlist,
    Other,
}

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "opus", "m4a", "aac", "wav", "wma"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "m4v", "wmv", "ts"];
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "ass", "ssa", "vtt", "sub"];
const PLAYLIST_EXTENSIONS: &[&str] = &["m3u", "m3u8"];

impl FileCategory {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        let ext = ext.as_str();
        if AUDIO_EXTENSIONS.contains(&ext) {
            FileCategory::Audio
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            FileCategory::Video
        } else if SUBTITLE_EXTENSIONS.contains(&ext) {
            FileCategory::Subtitle
        } else if PLAYLIST_EXTENSIONS.contains(&ext) {
            FileCategory::Playlist
        } else {
            FileCategory::Other
        }
    }

    pub fn is_media(&self) -> bool {
        matches!(self, FileCategory::Audio | FileCategory::Video)
    }
}

/// Build a `file://` URI for a local path, percent-encoding each component.
pub fn file_uri(path: &Path) -> String {
    let encoded: Vec<String> = path
        .to_string_lossy()
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("file://{}", encoded.join("/"))
}

/// Local path of a `file://` URI.
pub fn uri_path(uri: &str) -> Option<PathBuf> {
    let raw = uri.strip_prefix("file://")?;
    let decoded = urlencoding::decode(raw)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    Some(PathBuf::from(decoded))
}

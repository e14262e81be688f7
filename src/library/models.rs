use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Audio,
    Video,
    /// A network stream, only ever present in the stream history.
    Stream,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Media {
    pub id: i64,
    pub title: String,
    pub artist: Option<String>,
    pub album_id: Option<i64>,
    /// Length in milliseconds, 0 when unknown.
    pub duration_ms: i64,
    /// Location of the media, `file://` for local files.
    pub uri: String,
    pub kind: MediaKind,
    pub width: i32,
    pub height: i32,
    /// Saved playback position in milliseconds.
    pub progress_ms: i64,
    pub seen: bool,
    pub favorite: bool,
    pub artwork: Option<String>,
    /// Chapters as (title, start in ms).
    #[serde(default)]
    pub chapters: Vec<(String, i64)>,
}

impl Media {
    pub fn new(id: i64, title: &str, uri: &str, kind: MediaKind) -> Self {
        Self {
            id,
            title: title.to_string(),
            artist: None,
            album_id: None,
            duration_ms: 0,
            uri: uri.to_string(),
            kind,
            width: 0,
            height: 0,
            progress_ms: 0,
            seen: false,
            favorite: false,
            artwork: None,
            chapters: Vec::new(),
        }
    }

    /// Local filesystem path for `file://` media.
    pub fn file_path(&self) -> Option<std::path::PathBuf> {
        super::uri_path(&self.uri)
    }

    /// Extension of the underlying file including the leading dot, or empty.
    pub fn extension(&self) -> String {
        let last_segment = self.uri.rsplit('/').next().unwrap_or("");
        match last_segment.rfind('.') {
            Some(idx) => last_segment[idx..].to_string(),
            None => String::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub album_artist: Option<String>,
    pub duration_ms: i64,
    pub artwork: Option<String>,
    pub favorite: bool,
    pub track_ids: Vec<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub artwork: Option<String>,
    pub favorite: bool,
    pub album_ids: Vec<i64>,
    pub track_ids: Vec<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub favorite: bool,
    pub track_ids: Vec<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Playlist {
    pub id: i64,
    pub name: String,
    pub artwork: Option<String>,
    pub favorite: bool,
    pub media_ids: Vec<i64>,
}

/// Either a folder of videos on disk or a group of videos sharing a title prefix.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VideoCollection {
    pub id: i64,
    pub title: String,
    pub artwork: Option<String>,
    pub favorite: bool,
    pub media_ids: Vec<i64>,
}

pub type VideoFolder = VideoCollection;
pub type VideoGroup = VideoCollection;

/// A resolved library collection, flattened to its media.
#[derive(Clone, Debug, Default)]
pub struct CollectionContents {
    pub title: String,
    pub tracks: Vec<Media>,
    pub albums: Vec<Album>,
}

/// Everything matching a search query, grouped by entity type.
#[derive(Clone, Debug, Default)]
pub struct SearchAggregate {
    pub albums: Vec<Album>,
    pub artists: Vec<Artist>,
    pub genres: Vec<Genre>,
    pub playlists: Vec<Playlist>,
    pub videos: Vec<Media>,
    pub tracks: Vec<Media>,
}

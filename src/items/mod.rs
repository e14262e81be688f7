//! Transport records shared by every listing route and by the event stream.

mod normalizer;

pub use normalizer::*;

use serde::{Deserialize, Serialize};

/// Flat, transport-neutral item. Field names match the web client.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayQueueItem {
    pub id: i64,
    pub title: String,
    #[serde(rename = "artist")]
    pub subtitle: String,
    pub duration: i64,
    #[serde(rename = "artworkURL")]
    pub artwork_uri: String,
    pub playing: bool,
    #[serde(rename = "resolution")]
    pub resolution_tag: String,
    pub path: String,
    pub is_folder: bool,
    pub progress: i64,
    pub played: bool,
    pub file_type: String,
    pub favorite: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreadcrumbItem {
    pub title: String,
    pub path: String,
}

impl BreadcrumbItem {
    pub fn home() -> Self {
        Self {
            title: "Home".to_string(),
            path: "root".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrowsingResult {
    pub content: Vec<PlayQueueItem>,
    pub breadcrumb: Vec<BreadcrumbItem>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoListResult {
    pub content: Vec<PlayQueueItem>,
    /// Title of the opened group or folder, empty for top-level listings.
    pub item: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlbumResult {
    pub tracks: Vec<PlayQueueItem>,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtistResult {
    pub albums: Vec<PlayQueueItem>,
    pub tracks: Vec<PlayQueueItem>,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaylistResult {
    pub tracks: Vec<PlayQueueItem>,
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub albums: Vec<PlayQueueItem>,
    pub artists: Vec<PlayQueueItem>,
    pub genres: Vec<PlayQueueItem>,
    pub playlists: Vec<PlayQueueItem>,
    pub videos: Vec<PlayQueueItem>,
    pub tracks: Vec<PlayQueueItem>,
}

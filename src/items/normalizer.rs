//! Mapping of every content source onto [`PlayQueueItem`].

use super::PlayQueueItem;
use crate::browser::{BrowserEntry, EntryKind};
use crate::library::{Album, Artist, FileCategory, Genre, Media, MediaKind, Playlist, VideoCollection};
use byte_unit::{Byte, UnitType};

pub const DEFAULT_ARTIST: &str = "Unknown Artist";

/// Anything that can be listed to the client.
pub enum Entity<'a> {
    Media {
        media: &'a Media,
        /// Used when the media has no artist.
        default_artist: &'a str,
    },
    Album(&'a Album),
    Artist(&'a Artist),
    Genre(&'a Genre),
    Playlist(&'a Playlist),
    VideoFolder(&'a VideoCollection),
    VideoGroup {
        group: &'a VideoCollection,
        /// Every video of the group has been watched.
        played: bool,
    },
    /// A provider entry, with its positional id already computed.
    Entry {
        entry: &'a BrowserEntry,
        synthetic_id: i64,
        use_file_name: bool,
        /// The library's own record for the same URI, if any.
        library_media: Option<&'a Media>,
    },
}

pub fn normalize(entity: Entity<'_>) -> PlayQueueItem {
    match entity {
        Entity::Media {
            media,
            default_artist,
        } => PlayQueueItem {
            id: media.id,
            title: media.title.clone(),
            subtitle: media
                .artist
                .clone()
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| default_artist.to_string()),
            duration: media.duration_ms,
            artwork_uri: media.artwork.clone().unwrap_or_default(),
            resolution_tag: resolution_class(media.width, media.height)
                .unwrap_or_default()
                .to_string(),
            path: media.uri.clone(),
            progress: media.progress_ms,
            played: media.seen,
            file_type: media_file_type(media.kind).to_string(),
            favorite: media.favorite,
            ..Default::default()
        },
        Entity::Album(album) => PlayQueueItem {
            id: album.id,
            title: album.title.clone(),
            subtitle: album.album_artist.clone().unwrap_or_default(),
            duration: album.duration_ms,
            artwork_uri: album.artwork.clone().unwrap_or_default(),
            favorite: album.favorite,
            ..Default::default()
        },
        Entity::Artist(artist) => PlayQueueItem {
            id: artist.id,
            title: artist.name.clone(),
            subtitle: quantity(artist.album_ids.len(), "album", "albums"),
            artwork_uri: artist.artwork.clone().unwrap_or_default(),
            favorite: artist.favorite,
            ..Default::default()
        },
        Entity::Genre(genre) => PlayQueueItem {
            id: genre.id,
            title: genre.name.clone(),
            subtitle: quantity(genre.track_ids.len(), "track", "tracks"),
            favorite: genre.favorite,
            ..Default::default()
        },
        Entity::Playlist(playlist) => PlayQueueItem {
            id: playlist.id,
            title: playlist.name.clone(),
            subtitle: quantity(playlist.media_ids.len(), "track", "tracks"),
            artwork_uri: playlist.artwork.clone().unwrap_or_default(),
            favorite: playlist.favorite,
            ..Default::default()
        },
        Entity::VideoFolder(folder) => PlayQueueItem {
            id: folder.id,
            title: folder.title.clone(),
            subtitle: quantity(folder.media_ids.len(), "video", "videos"),
            artwork_uri: folder.artwork.clone().unwrap_or_default(),
            file_type: "video-folder".to_string(),
            favorite: folder.favorite,
            ..Default::default()
        },
        Entity::VideoGroup { group, played } => PlayQueueItem {
            id: group.id,
            title: group.title.clone(),
            subtitle: quantity(group.media_ids.len(), "video", "videos"),
            artwork_uri: group.artwork.clone().unwrap_or_default(),
            played,
            file_type: "video-group".to_string(),
            favorite: group.favorite,
            ..Default::default()
        },
        Entity::Entry {
            entry,
            synthetic_id,
            use_file_name,
            library_media,
        } => {
            let description = entry.description.clone().unwrap_or_default();
            let file_type = entry_file_type(entry.kind).to_string();
            if let Some(media) = library_media {
                return PlayQueueItem {
                    subtitle: description,
                    file_type,
                    ..normalize(Entity::Media {
                        media,
                        default_artist: "",
                    })
                };
            }
            let title = if use_file_name {
                entry.file_name.clone()
            } else {
                entry.title.clone()
            };
            PlayQueueItem {
                id: synthetic_id,
                title,
                subtitle: description,
                artwork_uri: entry.artwork.clone().unwrap_or_default(),
                path: entry.uri.clone(),
                is_folder: entry.kind == EntryKind::Directory,
                file_type,
                favorite: entry.favorite,
                ..Default::default()
            }
        }
    }
}

fn media_file_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Audio => "audio",
        MediaKind::Video => "video",
        MediaKind::Stream => "",
    }
}

fn entry_file_type(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Directory => "folder",
        EntryKind::File(FileCategory::Audio) => "audio",
        EntryKind::File(FileCategory::Video) => "video",
        EntryKind::File(FileCategory::Subtitle) => "subtitle",
        EntryKind::File(_) => "file",
    }
}

/// Resolution bucket of a video, using the smaller side as the height so
/// portrait videos are classed like their landscape counterparts.
pub fn resolution_class(width: i32, height: i32) -> Option<&'static str> {
    if width <= 0 || height <= 0 {
        return None;
    }
    let real_height = width.min(height) as f64;
    let real_width = width.max(height) as f64;
    const CLASSES: [(f64, &str); 5] = [
        (4320.0, "8K"),
        (2160.0, "4K"),
        (1440.0, "1440p"),
        (1080.0, "1080p"),
        (720.0, "720p"),
    ];
    for (lines, class) in CLASSES {
        if real_height >= lines || real_width >= lines * 16.0 / 9.0 {
            return Some(class);
        }
    }
    Some("SD")
}

pub fn quantity(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("1 {}", singular)
    } else {
        format!("{} {}", count, plural)
    }
}

/// `"N folders · M media files"`, or only the non-zero half.
/// Empty when both counts are zero.
pub fn folder_description(folders: usize, files: usize) -> String {
    let folders_text = quantity(folders, "folder", "folders");
    let files_text = quantity(files, "media file", "media files");
    match (folders > 0, files > 0) {
        (true, true) => format!("{} · {}", folders_text, files_text),
        (true, false) => folders_text,
        (false, true) => files_text,
        (false, false) => String::new(),
    }
}

pub fn format_file_size(bytes: u64) -> String {
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Decimal);
    format!("{:.1}", adjusted)
}

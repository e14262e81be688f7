//! Test fixture creation
//!
//! Builds a small media tree on disk and a library describing it.

use super::constants::*;
use remote_access_gateway::library::{
    file_uri, Album, Artist, Genre, InMemoryLibrary, ItemType, Media, MediaKind, Playlist,
    VideoCollection,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A real PNG, used as album cover
pub const COVER_PNG: &[u8] = include_bytes!("../../assets/file.png");

fn write(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn track(id: i64, title: &str, path: &Path, duration_ms: i64) -> Media {
    let mut media = Media::new(id, title, &file_uri(path), MediaKind::Audio);
    media.artist = Some(ARTIST_NAME.to_string());
    media.album_id = Some(ALBUM_ID);
    media.duration_ms = duration_ms;
    media
}

/// Creates the media tree and its library
///
/// Layout under the returned directory:
/// - `music/First Album/01 Opening.mp3`
/// - `music/First Album/02 Closing.mp3`
/// - `music/First Album/cover.png`
/// - `videos/Holiday.mp4`
/// - `downloads/` for prepared artifacts
pub fn create_test_library() -> anyhow::Result<(TempDir, InMemoryLibrary)> {
    let dir = TempDir::new()?;
    let album_dir = dir.path().join("music").join(ALBUM_TITLE);
    let opening = album_dir.join(format!("01 {}.mp3", TRACK_1_TITLE));
    let closing = album_dir.join(format!("02 {}.mp3", TRACK_2_TITLE));
    let cover = album_dir.join("cover.png");
    let holiday = dir.path().join("videos").join("Holiday.mp4");

    write(&opening, TRACK_1_CONTENT)?;
    write(&closing, b"closing track audio")?;
    write(&cover, COVER_PNG)?;
    write(&holiday, b"holiday video")?;
    fs::create_dir_all(dir.path().join("downloads"))?;

    let library = InMemoryLibrary::new();
    library.add_media(track(TRACK_1_ID, TRACK_1_TITLE, &opening, 180_000));
    library.add_media(track(TRACK_2_ID, TRACK_2_TITLE, &closing, 240_000));

    let mut video = Media::new(VIDEO_ID, "Holiday", &file_uri(&holiday), MediaKind::Video);
    video.duration_ms = 600_000;
    video.width = 1920;
    video.height = 1080;
    library.add_media(video);

    library.add_album(Album {
        id: ALBUM_ID,
        title: ALBUM_TITLE.to_string(),
        album_artist: Some(ARTIST_NAME.to_string()),
        duration_ms: 420_000,
        artwork: None,
        favorite: false,
        track_ids: vec![TRACK_1_ID, TRACK_2_ID],
    });
    library.set_artwork(ItemType::Album, ALBUM_ID, cover);

    library.add_artist(Artist {
        id: ARTIST_ID,
        name: ARTIST_NAME.to_string(),
        artwork: None,
        favorite: true,
        album_ids: vec![ALBUM_ID],
        track_ids: vec![TRACK_1_ID, TRACK_2_ID],
    });
    library.add_genre(Genre {
        id: GENRE_ID,
        name: "Rock".to_string(),
        favorite: false,
        track_ids: vec![TRACK_1_ID, TRACK_2_ID],
    });
    library.add_playlist(Playlist {
        id: PLAYLIST_ID,
        name: "Road Trip".to_string(),
        artwork: None,
        favorite: false,
        media_ids: vec![TRACK_2_ID, TRACK_1_ID],
    });
    library.add_video_folder(VideoCollection {
        id: VIDEO_FOLDER_ID,
        title: "videos".to_string(),
        artwork: None,
        favorite: false,
        media_ids: vec![VIDEO_ID],
    });

    Ok((dir, library))
}

//! In-process [`MediaLibrary`] implementation.
//!
//! Filled programmatically (tests) or by scanning a media directory. The scan
//! derives albums from directories holding audio files, artists from the
//! directory above them, video folders from directories holding videos and
//! playlists from `.m3u` files.

use super::{
    file_uri, Album, Artist, CollectionContents, FileCategory, Genre, HistoryKind, ItemType,
    Media, MediaKind, MediaLibrary, Playlist, SearchAggregate, VideoCollection,
};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const COVER_NAMES: &[&str] = &["cover.jpg", "cover.png", "folder.jpg", "folder.png"];
const VIDEO_GROUP_PREFIX_LEN: usize = 6;

#[derive(Default)]
struct LibraryData {
    media: BTreeMap<i64, Media>,
    albums: BTreeMap<i64, Album>,
    artists: BTreeMap<i64, Artist>,
    genres: BTreeMap<i64, Genre>,
    playlists: BTreeMap<i64, Playlist>,
    video_folders: BTreeMap<i64, VideoCollection>,
    video_groups: BTreeMap<i64, VideoCollection>,
    artworks: HashMap<(ItemType, i64), PathBuf>,
    local_history: Vec<i64>,
    network_history: Vec<Media>,
}

impl LibraryData {
    fn medias(&self, ids: &[i64]) -> Vec<Media> {
        ids.iter().filter_map(|id| self.media.get(id).cloned()).collect()
    }

    fn next_id<V>(map: &BTreeMap<i64, V>) -> i64 {
        map.keys().next_back().map(|k| k + 1).unwrap_or(1)
    }
}

#[derive(Default)]
pub struct InMemoryLibrary {
    data: RwLock<LibraryData>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, LibraryData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LibraryData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Programmatic population
    // =========================================================================

    pub fn add_media(&self, media: Media) {
        self.write().media.insert(media.id, media);
    }

    pub fn add_album(&self, album: Album) {
        self.write().albums.insert(album.id, album);
    }

    pub fn add_artist(&self, artist: Artist) {
        self.write().artists.insert(artist.id, artist);
    }

    pub fn add_genre(&self, genre: Genre) {
        self.write().genres.insert(genre.id, genre);
    }

    pub fn add_playlist(&self, playlist: Playlist) {
        self.write().playlists.insert(playlist.id, playlist);
    }

    pub fn add_video_folder(&self, folder: VideoCollection) {
        self.write().video_folders.insert(folder.id, folder);
    }

    pub fn add_video_group(&self, group: VideoCollection) {
        self.write().video_groups.insert(group.id, group);
    }

    pub fn set_artwork(&self, item_type: ItemType, id: i64, path: PathBuf) {
        self.write().artworks.insert((item_type, id), path);
    }

    /// Record a played media. Most recent first, no duplicates.
    pub fn record_played(&self, media_id: i64) {
        let mut data = self.write();
        data.local_history.retain(|id| *id != media_id);
        data.local_history.insert(0, media_id);
    }

    pub fn record_stream(&self, stream: Media) {
        let mut data = self.write();
        data.network_history.retain(|m| m.uri != stream.uri);
        data.network_history.insert(0, stream);
    }

    pub fn media_count(&self) -> usize {
        self.read().media.len()
    }

    // =========================================================================
    // Directory scan
    // =========================================================================

    /// Build a library from the media files found under `root`.
    pub fn scan(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve media directory {:?}", root))?;
        info!("Scanning media directory {:?}", root);

        let library = Self::new();
        let mut playlists = Vec::new();
        let mut albums_by_dir: BTreeMap<PathBuf, Vec<i64>> = BTreeMap::new();
        let mut videos_by_dir: BTreeMap<PathBuf, Vec<i64>> = BTreeMap::new();

        let mut entries: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(&root).follow_links(true) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => entries.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable entry while scanning: {}", e),
            }
        }
        entries.sort();

        {
            let mut data = library.write();
            for path in entries {
                let category = FileCategory::from_path(&path);
                let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
                let kind = match category {
                    FileCategory::Audio => MediaKind::Audio,
                    FileCategory::Video => MediaKind::Video,
                    FileCategory::Playlist => {
                        playlists.push(path);
                        continue;
                    }
                    _ => continue,
                };
                let id = LibraryData::next_id(&data.media);
                let title = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let media = Media::new(id, &title, &file_uri(&path), kind);
                data.media.insert(id, media);
                match kind {
                    MediaKind::Audio => albums_by_dir.entry(parent).or_default().push(id),
                    _ => videos_by_dir.entry(parent).or_default().push(id),
                }
            }

            for (dir, track_ids) in albums_by_dir {
                let album_id = LibraryData::next_id(&data.albums);
                let album_title = dir_name(&dir);
                let artist_name = dir
                    .parent()
                    .filter(|p| dir != root && p != &root.as_path())
                    .map(dir_name);
                let cover = COVER_NAMES.iter().map(|n| dir.join(n)).find(|p| p.is_file());

                for track_id in &track_ids {
                    if let Some(media) = data.media.get_mut(track_id) {
                        media.album_id = Some(album_id);
                        media.artist = artist_name.clone();
                        media.artwork = cover.as_ref().map(|c| file_uri(c));
                    }
                }
                if let Some(cover) = &cover {
                    data.artworks
                        .insert((ItemType::Album, album_id), cover.clone());
                }
                data.albums.insert(
                    album_id,
                    Album {
                        id: album_id,
                        title: album_title,
                        album_artist: artist_name.clone(),
                        duration_ms: 0,
                        artwork: cover.as_ref().map(|c| file_uri(c)),
                        favorite: false,
                        track_ids: track_ids.clone(),
                    },
                );

                if let Some(name) = artist_name {
                    let existing = data.artists.values().find(|a| a.name == name).map(|a| a.id);
                    let artist_id = existing.unwrap_or_else(|| LibraryData::next_id(&data.artists));
                    let artist = data.artists.entry(artist_id).or_insert_with(|| Artist {
                        id: artist_id,
                        name,
                        artwork: None,
                        favorite: false,
                        album_ids: Vec::new(),
                        track_ids: Vec::new(),
                    });
                    artist.album_ids.push(album_id);
                    artist.track_ids.extend(track_ids);
                }
            }

            for (dir, media_ids) in videos_by_dir {
                let folder_id = LibraryData::next_id(&data.video_folders);
                data.video_folders.insert(
                    folder_id,
                    VideoCollection {
                        id: folder_id,
                        title: dir_name(&dir),
                        artwork: None,
                        favorite: false,
                        media_ids,
                    },
                );
            }

            let mut groups: BTreeMap<String, Vec<i64>> = BTreeMap::new();
            for media in data.media.values().filter(|m| m.kind == MediaKind::Video) {
                let key: String = media
                    .title
                    .to_lowercase()
                    .chars()
                    .take(VIDEO_GROUP_PREFIX_LEN)
                    .collect();
                groups.entry(key).or_default().push(media.id);
            }
            for (prefix, media_ids) in groups {
                let group_id = LibraryData::next_id(&data.video_groups);
                let title = if media_ids.len() == 1 {
                    data.media
                        .get(&media_ids[0])
                        .map(|m| m.title.clone())
                        .unwrap_or(prefix)
                } else {
                    prefix
                };
                data.video_groups.insert(
                    group_id,
                    VideoCollection {
                        id: group_id,
                        title,
                        artwork: None,
                        favorite: false,
                        media_ids,
                    },
                );
            }

            for path in playlists {
                match parse_m3u(&path, &data) {
                    Ok(media_ids) => {
                        let playlist_id = LibraryData::next_id(&data.playlists);
                        let name = path
                            .file_stem()
                            .map(|s| s.to_string_lossy().to_string())
                            .unwrap_or_default();
                        debug!("Playlist {} with {} entries", name, media_ids.len());
                        data.playlists.insert(
                            playlist_id,
                            Playlist {
                                id: playlist_id,
                                name,
                                artwork: None,
                                favorite: false,
                                media_ids,
                            },
                        );
                    }
                    Err(e) => warn!("Failed to read playlist {:?}: {}", path, e),
                }
            }
        }

        info!(
            "Media scan done: {} media, {} albums, {} artists, {} playlists",
            library.read().media.len(),
            library.read().albums.len(),
            library.read().artists.len(),
            library.read().playlists.len()
        );
        Ok(library)
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Resolve the entries of an m3u playlist to known media ids.
fn parse_m3u(path: &Path, data: &LibraryData) -> Result<Vec<i64>> {
    let content = std::fs::read_to_string(path)?;
    let base = path.parent().unwrap_or(Path::new("/"));
    let ids = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let entry = base.join(line);
            let entry = entry.canonicalize().unwrap_or(entry);
            let uri = file_uri(&entry);
            data.media.values().find(|m| m.uri == uri).map(|m| m.id)
        })
        .collect();
    Ok(ids)
}

fn matches(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl MediaLibrary for InMemoryLibrary {
    fn media(&self, id: i64) -> Option<Media> {
        self.read().media.get(&id).cloned()
    }

    fn media_by_uri(&self, uri: &str) -> Option<Media> {
        self.read().media.values().find(|m| m.uri == uri).cloned()
    }

    fn album(&self, id: i64) -> Option<Album> {
        self.read().albums.get(&id).cloned()
    }

    fn artist(&self, id: i64) -> Option<Artist> {
        self.read().artists.get(&id).cloned()
    }

    fn genre(&self, id: i64) -> Option<Genre> {
        self.read().genres.get(&id).cloned()
    }

    fn playlist(&self, id: i64) -> Option<Playlist> {
        self.read().playlists.get(&id).cloned()
    }

    fn video_folder(&self, id: i64) -> Option<VideoCollection> {
        self.read().video_folders.get(&id).cloned()
    }

    fn video_group(&self, id: i64) -> Option<VideoCollection> {
        self.read().video_groups.get(&id).cloned()
    }

    fn videos(&self) -> Vec<Media> {
        self.read()
            .media
            .values()
            .filter(|m| m.kind == MediaKind::Video)
            .cloned()
            .collect()
    }

    fn audio_tracks(&self) -> Vec<Media> {
        self.read()
            .media
            .values()
            .filter(|m| m.kind == MediaKind::Audio)
            .cloned()
            .collect()
    }

    fn albums(&self) -> Vec<Album> {
        self.read().albums.values().cloned().collect()
    }

    fn artists(&self) -> Vec<Artist> {
        self.read().artists.values().cloned().collect()
    }

    fn genres(&self) -> Vec<Genre> {
        self.read().genres.values().cloned().collect()
    }

    fn playlists(&self) -> Vec<Playlist> {
        self.read().playlists.values().cloned().collect()
    }

    fn video_folders(&self) -> Vec<VideoCollection> {
        self.read().video_folders.values().cloned().collect()
    }

    fn video_groups(&self) -> Vec<VideoCollection> {
        self.read().video_groups.values().cloned().collect()
    }

    fn collection(&self, item_type: ItemType, id: i64) -> Option<CollectionContents> {
        let data = self.read();
        match item_type {
            ItemType::Media => data.media.get(&id).map(|m| CollectionContents {
                title: m.title.clone(),
                tracks: vec![m.clone()],
                albums: Vec::new(),
            }),
            ItemType::Album => data.albums.get(&id).map(|a| CollectionContents {
                title: a.title.clone(),
                tracks: data.medias(&a.track_ids),
                albums: Vec::new(),
            }),
            ItemType::Artist => data.artists.get(&id).map(|a| CollectionContents {
                title: a.name.clone(),
                tracks: data.medias(&a.track_ids),
                albums: a
                    .album_ids
                    .iter()
                    .filter_map(|id| data.albums.get(id).cloned())
                    .collect(),
            }),
            ItemType::Genre => data.genres.get(&id).map(|g| CollectionContents {
                title: g.name.clone(),
                tracks: data.medias(&g.track_ids),
                albums: Vec::new(),
            }),
            ItemType::Playlist => data.playlists.get(&id).map(|p| CollectionContents {
                title: p.name.clone(),
                tracks: data.medias(&p.media_ids),
                albums: Vec::new(),
            }),
            ItemType::VideoGroup => data.video_groups.get(&id).map(|g| CollectionContents {
                title: g.title.clone(),
                tracks: data.medias(&g.media_ids),
                albums: Vec::new(),
            }),
            ItemType::VideoFolder => data.video_folders.get(&id).map(|f| CollectionContents {
                title: f.title.clone(),
                tracks: data.medias(&f.media_ids),
                albums: Vec::new(),
            }),
        }
    }

    fn search(&self, query: &str) -> SearchAggregate {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return SearchAggregate::default();
        }
        let data = self.read();
        SearchAggregate {
            albums: data
                .albums
                .values()
                .filter(|a| matches(&a.title, &needle))
                .cloned()
                .collect(),
            artists: data
                .artists
                .values()
                .filter(|a| matches(&a.name, &needle))
                .cloned()
                .collect(),
            genres: data
                .genres
                .values()
                .filter(|g| matches(&g.name, &needle))
                .cloned()
                .collect(),
            playlists: data
                .playlists
                .values()
                .filter(|p| matches(&p.name, &needle))
                .cloned()
                .collect(),
            videos: data
                .media
                .values()
                .filter(|m| m.kind == MediaKind::Video && matches(&m.title, &needle))
                .cloned()
                .collect(),
            tracks: data
                .media
                .values()
                .filter(|m| m.kind == MediaKind::Audio && matches(&m.title, &needle))
                .cloned()
                .collect(),
        }
    }

    fn history(&self, kind: HistoryKind) -> Vec<Media> {
        let data = self.read();
        match kind {
            HistoryKind::Local => data.medias(&data.local_history),
            HistoryKind::Network => data.network_history.clone(),
        }
    }

    fn set_favorite(&self, item_type: ItemType, id: i64, favorite: bool) -> bool {
        let mut data = self.write();
        let flag = match item_type {
            ItemType::Media => data.media.get_mut(&id).map(|m| &mut m.favorite),
            ItemType::Album => data.albums.get_mut(&id).map(|a| &mut a.favorite),
            ItemType::Artist => data.artists.get_mut(&id).map(|a| &mut a.favorite),
            ItemType::Genre => data.genres.get_mut(&id).map(|g| &mut g.favorite),
            ItemType::Playlist => data.playlists.get_mut(&id).map(|p| &mut p.favorite),
            ItemType::VideoGroup => data.video_groups.get_mut(&id).map(|g| &mut g.favorite),
            ItemType::VideoFolder => data.video_folders.get_mut(&id).map(|f| &mut f.favorite),
        };
        match flag {
            Some(flag) => {
                *flag = favorite;
                true
            }
            None => false,
        }
    }

    fn create_playlist(&self, name: &str) -> Option<i64> {
        let mut data = self.write();
        if data.playlists.values().any(|p| p.name == name) {
            return None;
        }
        let id = LibraryData::next_id(&data.playlists);
        data.playlists.insert(
            id,
            Playlist {
                id,
                name: name.to_string(),
                artwork: None,
                favorite: false,
                media_ids: Vec::new(),
            },
        );
        Some(id)
    }

    fn add_to_playlist(&self, playlist_id: i64, media_ids: &[i64]) -> bool {
        let mut data = self.write();
        let known: Vec<i64> = media_ids
            .iter()
            .copied()
            .filter(|id| data.media.contains_key(id))
            .collect();
        match data.playlists.get_mut(&playlist_id) {
            Some(playlist) => {
                playlist.media_ids.extend(known);
                true
            }
            None => false,
        }
    }

    fn artwork(&self, item_type: ItemType, id: i64) -> Option<PathBuf> {
        let data = self.read();
        if let Some(path) = data.artworks.get(&(item_type, id)) {
            return Some(path.clone());
        }
        // Tracks fall back to their album cover
        if item_type == ItemType::Media {
            let album_id = data.media.get(&id)?.album_id?;
            return data.artworks.get(&(ItemType::Album, album_id)).cloned();
        }
        None
    }
}

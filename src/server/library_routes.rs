//! Listing routes over the structured media library.
//!
//! These only normalize: nothing here is enriched asynchronously.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::{Form, FormRejection};
use serde::Deserialize;
use tracing::{debug, info};

use super::session::ensure_feature;
use super::state::{GuardedLibrary, ServerState};
use crate::items::{
    normalize, AlbumResult, ArtistResult, Entity, PlayQueueItem, PlaylistResult, SearchResults,
    VideoListResult, DEFAULT_ARTIST,
};
use crate::library::{HistoryKind, ItemType, Media, MediaKind};
use crate::pairing::Session;

type JsonResult<T> = Result<Json<T>, StatusCode>;

#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoListQuery {
    pub grouping: Option<i32>,
    pub group: Option<i64>,
    pub folder: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaylistCreateForm {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistAddForm {
    pub media_id: Option<i64>,
    pub media_type: Option<String>,
    #[serde(rename = "playlists[]", default)]
    pub playlists: Vec<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FavoriteQuery {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub id: Option<i64>,
    pub favorite: Option<String>,
}

/// Tracks without an artist show a placeholder, videos show nothing.
fn media_item(media: &Media) -> PlayQueueItem {
    let default_artist = match media.kind {
        MediaKind::Audio => DEFAULT_ARTIST,
        _ => "",
    };
    normalize(Entity::Media {
        media,
        default_artist,
    })
}

fn media_items(medias: &[Media]) -> Vec<PlayQueueItem> {
    medias.iter().map(media_item).collect()
}

fn collection_tracks(
    library: &GuardedLibrary,
    item_type: ItemType,
    id: Option<i64>,
) -> Result<(String, Vec<PlayQueueItem>), StatusCode> {
    let id = id.ok_or(StatusCode::NOT_FOUND)?;
    let contents = library
        .collection(item_type, id)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok((contents.title, media_items(&contents.tracks)))
}

// =============================================================================
// Videos
// =============================================================================

async fn get_video_list(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<VideoListQuery>,
) -> JsonResult<VideoListResult> {
    ensure_feature(state.config.features.videos)?;
    let library = &state.library;

    let opened = match (query.group, query.folder) {
        (Some(id), _) => Some((ItemType::VideoGroup, id)),
        (None, Some(id)) => Some((ItemType::VideoFolder, id)),
        (None, None) => None,
    };
    if let Some((item_type, id)) = opened {
        let (title, content) = collection_tracks(library, item_type, Some(id))?;
        return Ok(Json(VideoListResult {
            content,
            item: title,
        }));
    }

    let content = match query.grouping.unwrap_or(0) {
        0 => media_items(&library.videos()),
        1 => library
            .video_folders()
            .iter()
            .map(|folder| normalize(Entity::VideoFolder(folder)))
            .collect(),
        _ => library
            .video_groups()
            .iter()
            .map(|group| {
                let played = library
                    .collection(ItemType::VideoGroup, group.id)
                    .is_some_and(|c| !c.tracks.is_empty() && c.tracks.iter().all(|m| m.seen));
                normalize(Entity::VideoGroup { group, played })
            })
            .collect(),
    };
    Ok(Json(VideoListResult {
        content,
        item: String::new(),
    }))
}

// =============================================================================
// Audio
// =============================================================================

async fn get_album_list(
    _session: Session,
    State(state): State<ServerState>,
) -> JsonResult<Vec<PlayQueueItem>> {
    ensure_feature(state.config.features.audio)?;
    let albums = state.library.albums();
    Ok(Json(albums.iter().map(|a| normalize(Entity::Album(a))).collect()))
}

async fn get_artist_list(
    _session: Session,
    State(state): State<ServerState>,
) -> JsonResult<Vec<PlayQueueItem>> {
    ensure_feature(state.config.features.audio)?;
    let artists = state.library.artists();
    Ok(Json(artists.iter().map(|a| normalize(Entity::Artist(a))).collect()))
}

async fn get_track_list(
    _session: Session,
    State(state): State<ServerState>,
) -> JsonResult<Vec<PlayQueueItem>> {
    ensure_feature(state.config.features.audio)?;
    Ok(Json(media_items(&state.library.audio_tracks())))
}

async fn get_genre_list(
    _session: Session,
    State(state): State<ServerState>,
) -> JsonResult<Vec<PlayQueueItem>> {
    ensure_feature(state.config.features.audio)?;
    let genres = state.library.genres();
    Ok(Json(genres.iter().map(|g| normalize(Entity::Genre(g))).collect()))
}

async fn get_album(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<IdQuery>,
) -> JsonResult<AlbumResult> {
    ensure_feature(state.config.features.audio)?;
    let (name, tracks) = collection_tracks(&state.library, ItemType::Album, query.id)?;
    Ok(Json(AlbumResult { tracks, name }))
}

async fn get_genre(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<IdQuery>,
) -> JsonResult<AlbumResult> {
    ensure_feature(state.config.features.audio)?;
    let (name, tracks) = collection_tracks(&state.library, ItemType::Genre, query.id)?;
    Ok(Json(AlbumResult { tracks, name }))
}

async fn get_artist(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<IdQuery>,
) -> JsonResult<ArtistResult> {
    ensure_feature(state.config.features.audio)?;
    let id = query.id.ok_or(StatusCode::NOT_FOUND)?;
    let contents = state
        .library
        .collection(ItemType::Artist, id)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(ArtistResult {
        albums: contents
            .albums
            .iter()
            .map(|a| normalize(Entity::Album(a)))
            .collect(),
        tracks: media_items(&contents.tracks),
        name: contents.title,
    }))
}

async fn get_playlist(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<IdQuery>,
) -> JsonResult<PlaylistResult> {
    ensure_feature(state.config.features.audio)?;
    let (name, tracks) = collection_tracks(&state.library, ItemType::Playlist, query.id)?;
    Ok(Json(PlaylistResult { tracks, name }))
}

// =============================================================================
// Playlists, search, history
// =============================================================================

async fn get_playlist_list(
    _session: Session,
    State(state): State<ServerState>,
) -> JsonResult<Vec<PlayQueueItem>> {
    ensure_feature(state.config.features.playlists)?;
    let playlists = state.library.playlists();
    Ok(Json(
        playlists
            .iter()
            .map(|p| normalize(Entity::Playlist(p)))
            .collect(),
    ))
}

/// `204` without a name, `409` when a playlist already has it.
async fn post_playlist_create(
    _session: Session,
    State(state): State<ServerState>,
    form: Result<Form<PlaylistCreateForm>, FormRejection>,
) -> Response {
    if let Err(status) = ensure_feature(state.config.features.playlists) {
        return status.into_response();
    }
    let name = form
        .ok()
        .and_then(|Form(form)| form.name)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());
    let Some(name) = name else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match state.library.create_playlist(&name) {
        Some(id) => {
            info!("Created playlist {} '{}'", id, name);
            (StatusCode::OK, "").into_response()
        }
        None => (
            StatusCode::CONFLICT,
            format!("Playlist {} already exists", name),
        )
            .into_response(),
    }
}

/// Append a media, or every track of a collection, to each listed playlist.
/// `204` when the media can't be resolved.
async fn post_playlist_add(
    _session: Session,
    State(state): State<ServerState>,
    form: Result<Form<PlaylistAddForm>, FormRejection>,
) -> Response {
    if let Err(status) = ensure_feature(state.config.features.playlists) {
        return status.into_response();
    }
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            debug!("Ignoring unreadable playlist form: {}", rejection);
            PlaylistAddForm::default()
        }
    };
    let (Some(media_id), Some(media_type)) = (form.media_id, form.media_type) else {
        return StatusCode::NO_CONTENT.into_response();
    };
    let item_type = ItemType::parse(Some(&media_type));
    let Some(contents) = state.library.collection(item_type, media_id) else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let media_ids: Vec<i64> = contents.tracks.iter().map(|m| m.id).collect();
    for playlist_id in &form.playlists {
        if !state.library.add_to_playlist(*playlist_id, &media_ids) {
            debug!("No playlist {} to add to", playlist_id);
        }
    }
    debug!(
        "Added {} media to {} playlists",
        media_ids.len(),
        form.playlists.len()
    );
    (StatusCode::OK, "").into_response()
}

async fn get_search(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> JsonResult<SearchResults> {
    ensure_feature(state.config.features.search)?;
    let Some(search) = query.search.filter(|s| !s.trim().is_empty()) else {
        return Ok(Json(SearchResults::default()));
    };
    let found = state.library.search(&search);
    debug!(
        "Search '{}' matched {} tracks and {} videos",
        search,
        found.tracks.len(),
        found.videos.len()
    );
    Ok(Json(SearchResults {
        albums: found.albums.iter().map(|a| normalize(Entity::Album(a))).collect(),
        artists: found
            .artists
            .iter()
            .map(|a| normalize(Entity::Artist(a)))
            .collect(),
        genres: found.genres.iter().map(|g| normalize(Entity::Genre(g))).collect(),
        playlists: found
            .playlists
            .iter()
            .map(|p| normalize(Entity::Playlist(p)))
            .collect(),
        videos: media_items(&found.videos),
        tracks: media_items(&found.tracks),
    }))
}

async fn get_history(
    _session: Session,
    State(state): State<ServerState>,
) -> JsonResult<Vec<PlayQueueItem>> {
    ensure_feature(state.config.features.history)?;
    Ok(Json(media_items(&state.library.history(HistoryKind::Local))))
}

/// Recently opened network streams, shown as openable locations.
async fn get_stream_list(
    _session: Session,
    State(library): State<GuardedLibrary>,
) -> Json<Vec<PlayQueueItem>> {
    let streams = library.history(HistoryKind::Network);
    Json(
        streams
            .iter()
            .map(|stream| PlayQueueItem {
                id: stream.id,
                title: stream.title.clone(),
                subtitle: " ".to_string(),
                artwork_uri: stream.artwork.clone().unwrap_or_default(),
                path: stream.uri.clone(),
                is_folder: true,
                favorite: stream.favorite,
                ..Default::default()
            })
            .collect(),
    )
}

async fn get_favorite(
    _session: Session,
    State(library): State<GuardedLibrary>,
    Query(query): Query<FavoriteQuery>,
) -> Response {
    let Some(id) = query.id else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let item_type = ItemType::parse(query.item_type.as_deref());
    let favorite = query.favorite.as_deref().map_or(true, |f| f == "true");
    if library.set_favorite(item_type, id, favorite) {
        debug!("Set favorite={} on {} {}", favorite, item_type.as_str(), id);
        (StatusCode::OK, "").into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

pub fn make_library_routes(state: ServerState) -> Router {
    Router::new()
        .route("/video-list", get(get_video_list))
        .route("/album-list", get(get_album_list))
        .route("/artist-list", get(get_artist_list))
        .route("/track-list", get(get_track_list))
        .route("/genre-list", get(get_genre_list))
        .route("/album", get(get_album))
        .route("/artist", get(get_artist))
        .route("/genre", get(get_genre))
        .route("/playlist", get(get_playlist))
        .route("/playlist-list", get(get_playlist_list))
        .route("/playlist-create", post(post_playlist_create))
        .route("/playlist-add", post(post_playlist_add))
        .route("/search", get(get_search))
        .route("/history", get(get_history))
        .route("/stream-list", get(get_stream_list))
        .route("/favorite", get(get_favorite))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureFlags;
    use crate::library::{Album, Artist, InMemoryLibrary, VideoCollection};
    use crate::server::test_support::{open_config, test_state_with};
    use crate::server::ServerConfig;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn track(id: i64, title: &str, album_id: i64) -> Media {
        let mut media = Media::new(
            id,
            title,
            &format!("file:///music/{}.mp3", title),
            MediaKind::Audio,
        );
        media.album_id = Some(album_id);
        media
    }

    fn library() -> InMemoryLibrary {
        let library = InMemoryLibrary::new();
        library.add_media(track(1, "First", 10));
        let mut second = track(2, "Second", 10);
        second.artist = Some("Band".to_string());
        library.add_media(second);
        let mut video = Media::new(3, "Clip", "file:///videos/clip.mkv", MediaKind::Video);
        video.seen = true;
        library.add_media(video);
        library.add_album(Album {
            id: 10,
            title: "Record".to_string(),
            album_artist: Some("Band".to_string()),
            duration_ms: 0,
            artwork: None,
            favorite: false,
            track_ids: vec![1, 2],
        });
        library.add_artist(Artist {
            id: 20,
            name: "Band".to_string(),
            artwork: None,
            favorite: false,
            album_ids: vec![10],
            track_ids: vec![2],
        });
        library.add_video_group(VideoCollection {
            id: 30,
            title: "Clips".to_string(),
            artwork: None,
            favorite: false,
            media_ids: vec![3],
        });
        library
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn app() -> Router {
        make_library_routes(test_state_with(open_config(), library()))
    }

    #[tokio::test]
    async fn album_returns_tracks_with_default_artist() {
        let (status, body) = get_json(app(), "/album?id=10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Record");
        assert_eq!(body["tracks"][0]["artist"], DEFAULT_ARTIST);
        assert_eq!(body["tracks"][1]["artist"], "Band");
        assert_eq!(body["tracks"][1]["fileType"], "audio");
    }

    #[tokio::test]
    async fn unknown_or_missing_ids_are_not_found() {
        assert_eq!(get_json(app(), "/album?id=99").await.0, StatusCode::NOT_FOUND);
        assert_eq!(get_json(app(), "/playlist").await.0, StatusCode::NOT_FOUND);
        assert_eq!(get_json(app(), "/artist?id=1").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn artist_lists_albums_and_tracks() {
        let (status, body) = get_json(app(), "/artist?id=20").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Band");
        assert_eq!(body["albums"][0]["title"], "Record");
        assert_eq!(body["tracks"][0]["id"], 2);
    }

    #[tokio::test]
    async fn video_list_groupings() {
        let (_, videos) = get_json(app(), "/video-list").await;
        assert_eq!(videos["content"][0]["title"], "Clip");
        assert_eq!(videos["item"], "");

        let (_, groups) = get_json(app(), "/video-list?grouping=2").await;
        assert_eq!(groups["content"][0]["fileType"], "video-group");
        assert_eq!(groups["content"][0]["played"], true);

        let (_, opened) = get_json(app(), "/video-list?group=30").await;
        assert_eq!(opened["item"], "Clips");
        assert_eq!(opened["content"][0]["id"], 3);
    }

    #[tokio::test]
    async fn search_without_query_is_empty() {
        let (status, body) = get_json(app(), "/search").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tracks"], serde_json::json!([]));

        let (_, body) = get_json(app(), "/search?search=sec").await;
        assert_eq!(body["tracks"][0]["title"], "Second");
    }

    #[tokio::test]
    async fn disabled_features_are_forbidden() {
        let config = ServerConfig {
            bypass_auth: true,
            features: FeatureFlags {
                audio: false,
                history: false,
                ..FeatureFlags::all()
            },
            ..Default::default()
        };
        let app = make_library_routes(test_state_with(config, library()));
        assert_eq!(
            get_json(app.clone(), "/album-list").await.0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(get_json(app.clone(), "/history").await.0, StatusCode::FORBIDDEN);
        assert_eq!(get_json(app, "/video-list").await.0, StatusCode::OK);
    }

    async fn post_form(app: Router, uri: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    #[tokio::test]
    async fn playlist_create_refuses_taken_names() {
        let state = test_state_with(open_config(), library());
        let app = make_library_routes(state.clone());

        let (status, _) = post_form(app.clone(), "/playlist-create", "name=Road+Trip").await;
        assert_eq!(status, StatusCode::OK);
        let playlists = state.library.playlists();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].name, "Road Trip");

        let (status, body) = post_form(app.clone(), "/playlist-create", "name=Road+Trip").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.contains("Road Trip"));

        let (status, _) = post_form(app, "/playlist-create", "").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn playlist_add_appends_collections_to_every_listed_playlist() {
        let state = test_state_with(open_config(), library());
        let first = state.library.create_playlist("One").unwrap();
        let second = state.library.create_playlist("Two").unwrap();
        let app = make_library_routes(state.clone());

        let body = format!(
            "mediaId=10&mediaType=album&playlists%5B%5D={}&playlists%5B%5D={}",
            first, second
        );
        let (status, _) = post_form(app.clone(), "/playlist-add", &body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.library.playlist(first).unwrap().media_ids, vec![1, 2]);
        assert_eq!(state.library.playlist(second).unwrap().media_ids, vec![1, 2]);

        let body = format!("mediaId=3&mediaType=media&playlists%5B%5D={}", first);
        post_form(app.clone(), "/playlist-add", &body).await;
        assert_eq!(
            state.library.playlist(first).unwrap().media_ids,
            vec![1, 2, 3]
        );

        // Nothing to resolve
        let (status, _) = post_form(app.clone(), "/playlist-add", "mediaType=album").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let body = format!("mediaId=99&mediaType=album&playlists%5B%5D={}", first);
        let (status, _) = post_form(app, "/playlist-add", &body).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn playlist_edits_follow_the_feature_flag() {
        let config = ServerConfig {
            features: FeatureFlags {
                playlists: false,
                ..FeatureFlags::all()
            },
            ..open_config()
        };
        let state = test_state_with(config, library());
        let app = make_library_routes(state.clone());

        let (status, _) = post_form(app.clone(), "/playlist-create", "name=Mix").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = post_form(app, "/playlist-add", "mediaId=1&mediaType=media").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(state.library.playlists().is_empty());
    }

    #[tokio::test]
    async fn favorite_toggles_existing_entities_only() {
        let state = test_state_with(open_config(), library());
        let app = make_library_routes(state.clone());

        let (status, _) = get_json(app.clone(), "/favorite?type=album&id=10").await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.library.album(10).unwrap().favorite);

        let (status, _) = get_json(app.clone(), "/favorite?type=album&id=10&favorite=false").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!state.library.album(10).unwrap().favorite);

        let (status, _) = get_json(app, "/favorite?id=404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

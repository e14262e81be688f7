//! Long-poll delivery and playback command routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, error};

use super::state::ServerState;
use crate::browser::{BrowserProvider, Dataset, EntryKind, FileBrowserProvider};
use crate::events::Event;
use crate::library::{uri_path, FileCategory, ItemType, Media, MediaKind};
use crate::pairing::Session;
use crate::playback::{dispatch, IncomingMessage, LoadOutcome, LoadRequest, PlayerError};

/// Id given to media opened by location that the library does not know.
const UNKNOWN_MEDIA_ID: i64 = -1;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackEventQuery {
    pub message: Option<String>,
    pub id: Option<i32>,
    pub long_value: Option<i64>,
    pub float_value: Option<f32>,
    pub string_value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayQuery {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub id: Option<i64>,
    pub append: Option<String>,
    pub audio: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeQuery {
    pub resume: Option<String>,
    pub apply_playlist: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResumePlaybackQuery {
    pub audio: Option<String>,
}

fn is_true(value: &Option<String>, default: bool) -> bool {
    value.as_deref().map_or(default, |v| v == "true")
}

fn internal_error(e: PlayerError) -> Response {
    error!("Player request failed: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

/// Loading anything is playback control too.
fn ensure_control(state: &ServerState) -> Result<(), Response> {
    if state.config.features.playback_control {
        return Ok(());
    }
    state
        .event_bus
        .publish(Event::PlaybackControlForbidden { forbidden: true });
    Err(StatusCode::FORBIDDEN.into_response())
}

// =============================================================================
// Events
// =============================================================================

/// Queued events right away, or the next event within the timeout, or a
/// fresh snapshot of the player.
async fn get_longpolling(_session: Session, State(state): State<ServerState>) -> Response {
    if let Some(events) = state
        .event_bus
        .long_poll(state.config.timeouts.long_poll)
        .await
    {
        return Json(events).into_response();
    }
    match state.player.snapshot().await {
        Ok(snapshot) => Json(snapshot.events()).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_playback_event(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<PlaybackEventQuery>,
) -> Response {
    let Some(message) = query.message else {
        return StatusCode::OK.into_response();
    };
    let message = IncomingMessage {
        message,
        id: query.id,
        float_value: query.float_value,
        long_value: query.long_value,
        string_value: query.string_value,
        auth_ticket: None,
    };

    match dispatch(
        &state.player,
        &state.event_bus,
        &state.config.features,
        &message,
    )
    .await
    {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => StatusCode::FORBIDDEN.into_response(),
        Err(PlayerError::UnknownCommand(name)) => {
            debug!("Unknown command {}", name);
            StatusCode::FORBIDDEN.into_response()
        }
        Err(e) => internal_error(e),
    }
}

// =============================================================================
// Loading
// =============================================================================

/// The library record for a location, or a bare media built from it.
fn media_for_location(state: &ServerState, location: &str) -> Media {
    if let Some(media) = state.library.media_by_uri(location) {
        return media;
    }
    let trimmed = location.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let title = urlencoding::decode(last)
        .map(|t| t.into_owned())
        .unwrap_or_else(|_| last.to_string());
    let category = uri_path(location)
        .map(|p| FileCategory::from_path(&p))
        .unwrap_or(FileCategory::Other);
    let kind = match category {
        FileCategory::Video => MediaKind::Video,
        FileCategory::Audio => MediaKind::Audio,
        _ if location.contains("://") && !location.starts_with("file://") => MediaKind::Stream,
        _ => MediaKind::Audio,
    };
    Media::new(UNKNOWN_MEDIA_ID, &title, location, kind)
}

/// Playable files directly inside a browsed directory, in listing order.
async fn directory_medias(state: &ServerState, path: &str) -> Vec<Media> {
    let provider = FileBrowserProvider::new(path);
    let dataset = Dataset::new();
    provider.list_items(dataset.clone()).await;
    dataset
        .snapshot()
        .iter()
        .filter(|entry| matches!(entry.kind, EntryKind::File(c) if c.is_media()))
        .map(|entry| media_for_location(state, &entry.uri))
        .collect()
}

async fn load_medias(state: &ServerState, medias: Vec<Media>, append: bool, as_audio: bool) -> Response {
    if medias.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }
    let request = LoadRequest {
        medias,
        start_index: 0,
        append,
        as_audio,
    };
    match state.player.load(request).await {
        Ok(LoadOutcome::Started) => StatusCode::OK.into_response(),
        Ok(LoadOutcome::AlreadyCurrent) => {
            debug!("Requested media is already playing");
            StatusCode::OK.into_response()
        }
        Ok(LoadOutcome::Forbidden(reason)) => (StatusCode::FORBIDDEN, reason).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_play(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<PlayQuery>,
) -> Response {
    if let Err(response) = ensure_control(&state) {
        return response;
    }
    let append = is_true(&query.append, false);
    let as_audio = is_true(&query.audio, false);

    let medias = match query.path.as_deref().filter(|p| !p.is_empty()) {
        Some(path) => vec![media_for_location(&state, path)],
        None => {
            let Some(id) = query.id else {
                return StatusCode::NOT_FOUND.into_response();
            };
            let item_type = ItemType::parse(query.item_type.as_deref());
            match state.library.collection(item_type, id) {
                Some(contents) => contents.tracks,
                None => return StatusCode::NOT_FOUND.into_response(),
            }
        }
    };
    load_medias(&state, medias, append, as_audio).await
}

async fn get_play_all(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<PlayQuery>,
) -> Response {
    if let Err(response) = ensure_control(&state) {
        return response;
    }
    let medias = match query.item_type.as_deref() {
        Some("browser") => match query.path.as_deref() {
            Some(path) => directory_medias(&state, path).await,
            None => Vec::new(),
        },
        Some(kind @ ("video-group" | "video-folder" | "artist" | "album" | "genre" | "playlist")) => {
            let Some(id) = query.id else {
                return StatusCode::NOT_FOUND.into_response();
            };
            state
                .library
                .collection(ItemType::parse(Some(kind)), id)
                .map(|c| c.tracks)
                .unwrap_or_default()
        }
        _ => state.library.audio_tracks(),
    };
    load_medias(&state, medias, false, false).await
}

async fn get_resume(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<ResumeQuery>,
) -> Response {
    let resume = is_true(&query.resume, true);
    let apply_to_playlist = is_true(&query.apply_playlist, true);
    match state.player.resume(resume, apply_to_playlist).await {
        Ok(answered) => {
            if !answered {
                debug!("No resume question was pending");
            }
            StatusCode::OK.into_response()
        }
        Err(e) => internal_error(e),
    }
}

async fn get_resume_playback(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<ResumePlaybackQuery>,
) -> Response {
    if let Err(response) = ensure_control(&state) {
        return response;
    }
    let audio = is_true(&query.audio, true);
    match state.player.resume_last_playlist(audio).await {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error(e),
    }
}

pub fn make_playback_routes(state: ServerState) -> Router {
    Router::new()
        .route("/longpolling", get(get_longpolling))
        .route("/playback-event", get(get_playback_event))
        .route("/play", get(get_play))
        .route("/play-all", get(get_play_all))
        .route("/resume", get(get_resume))
        .route("/resume-playback", get(get_resume_playback))
        .with_state(state)
}

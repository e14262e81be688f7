//! Artwork route.
//!
//! Always answers with an image: when nothing better resolves, a built-in
//! placeholder is served.

use std::path::PathBuf;

use axum::{
    extract::{Query, State},
    http::header,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{debug, warn};

use super::http_cache;
use super::state::ServerState;
use crate::library::{uri_path, ItemType};
use crate::pairing::Session;

const NO_MEDIA_ICON: &[u8] = include_bytes!("../../assets/no_media.png");
const FOLDER_ICON: &[u8] = include_bytes!("../../assets/folder.png");
const FILE_ICON: &[u8] = include_bytes!("../../assets/file.png");
const SUBTITLE_ICON: &[u8] = include_bytes!("../../assets/subtitle.png");
const STREAM_ADD_ICON: &[u8] = include_bytes!("../../assets/stream_add.png");

const LARGE_SUFFIX: &str = "_big";

#[derive(Debug, Default, Deserialize)]
pub struct ArtworkQuery {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub id: Option<i64>,
    pub artwork: Option<String>,
}

/// Serve `bytes` if they hold an image.
fn image_response(bytes: Vec<u8>) -> Option<Response> {
    let kind = infer::get(&bytes)?;
    if !kind.mime_type().starts_with("image/") {
        return None;
    }
    Some(([(header::CONTENT_TYPE, kind.mime_type())], bytes).into_response())
}

fn icon_response(icon: &'static [u8]) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], icon).into_response()
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

async fn fetch_remote(client: &reqwest::Client, url: &str) -> Option<Vec<u8>> {
    let response = match client.get(url).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            debug!("Artwork {} answered {}", url, response.status());
            return None;
        }
        Err(e) => {
            warn!("Failed to fetch artwork {}: {}", url, e);
            return None;
        }
    };
    match response.bytes().await {
        Ok(bytes) => Some(bytes.to_vec()),
        Err(e) => {
            warn!("Failed to read artwork {}: {}", url, e);
            None
        }
    }
}

/// Read an artwork from a URL, a `file://` URI or a plain path.
async fn load_source(client: &reqwest::Client, source: &str) -> Option<Response> {
    if source.is_empty() {
        return None;
    }
    let bytes = if is_remote(source) {
        fetch_remote(client, source).await?
    } else {
        let path = uri_path(source).unwrap_or_else(|| PathBuf::from(source));
        match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Cannot read artwork {:?}: {}", path, e);
                return None;
            }
        }
    };
    image_response(bytes)
}

fn type_icon(item_type: &str) -> Option<&'static [u8]> {
    match item_type {
        "folder" | "network" => Some(FOLDER_ICON),
        "file" => Some(FILE_ICON),
        "subtitle" => Some(SUBTITLE_ICON),
        "new-stream" => Some(STREAM_ADD_ICON),
        _ => None,
    }
}

async fn get_artwork(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<ArtworkQuery>,
) -> Response {
    let requested = query.item_type.as_deref().unwrap_or("media");
    let item_type = requested.strip_suffix(LARGE_SUFFIX).unwrap_or(requested);
    let explicit = query.artwork.as_deref().unwrap_or("");

    if let Some(icon) = type_icon(item_type) {
        let is_folder = matches!(item_type, "folder" | "network");
        if is_folder && is_remote(explicit) {
            if let Some(response) = load_source(&state.http_client, explicit).await {
                return response;
            }
        }
        return icon_response(icon);
    }

    if let Some(response) = load_source(&state.http_client, explicit).await {
        return response;
    }

    let library_type = ItemType::parse(Some(item_type));
    match query.id {
        Some(id) => {
            if let Some(path) = state.library.artwork(library_type, id) {
                if let Some(response) = load_source(&state.http_client, &path.to_string_lossy()).await
                {
                    return response;
                }
            }
        }
        None => {
            if let Some(response) = current_media_artwork(&state).await {
                return response;
            }
        }
    }

    debug!("No artwork for {} {:?}, serving placeholder", requested, query.id);
    icon_response(NO_MEDIA_ICON)
}

async fn current_media_artwork(state: &ServerState) -> Option<Response> {
    let media = match state.player.snapshot().await {
        Ok(snapshot) => snapshot.current_media?,
        Err(e) => {
            warn!("Cannot read current media: {}", e);
            return None;
        }
    };
    if let Some(artwork) = media.artwork.as_deref() {
        if let Some(response) = load_source(&state.http_client, artwork).await {
            return Some(response);
        }
    }
    let path = state.library.artwork(ItemType::Media, media.id)?;
    load_source(&state.http_client, &path.to_string_lossy()).await
}

pub fn make_artwork_routes(state: ServerState) -> Router {
    Router::new()
        .route("/artwork", get(get_artwork))
        .layer(middleware::from_fn_with_state(
            state.config.artwork_cache_age_sec,
            http_cache,
        ))
        .with_state(state)
}

//! Download HTTP routes.
//!
//! Provides endpoints for:
//! - Preparing a download: a single media is streamed right away, a
//!   collection is zipped and its artifact name returned
//! - Fetching a prepared artifact, exactly once
//! - Listing and fetching the server's log files

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use super::session::ensure_feature;
use crate::download::{list_log_files, LogFile, PackagerError};
use crate::library::ItemType;
use crate::pairing::Session;
use crate::server::state::{GuardedPackager, ServerState};

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PrepareDownloadQuery {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub file: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

fn attachment(file: File, len: u64, file_name: &str) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        file_name.replace(['"', '\\'], "_")
    );
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, len)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(ReaderStream::new(file)))
        .unwrap_or_else(|e| {
            error!("Failed to build download response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

fn packager_error_response(e: PackagerError) -> Response {
    match e {
        PackagerError::NotFound(..)
        | PackagerError::MissingArtifact(_)
        | PackagerError::InvalidFilename(_) => {
            debug!("Download not found: {}", e);
            StatusCode::NOT_FOUND.into_response()
        }
        e => {
            error!("Download failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn prepare_download(
    _session: Session,
    State(packager): State<GuardedPackager>,
    Query(query): Query<PrepareDownloadQuery>,
) -> Response {
    let Some(id) = query.id else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let item_type = ItemType::parse(query.item_type.as_deref());

    if item_type == ItemType::Media {
        let media_file = match packager.media_file(id) {
            Ok(media_file) => media_file,
            Err(e) => return packager_error_response(e),
        };
        let file = match File::open(&media_file.path).await {
            Ok(file) => file,
            Err(e) => return packager_error_response(e.into()),
        };
        let len = match file.metadata().await {
            Ok(metadata) => metadata.len(),
            Err(e) => return packager_error_response(e.into()),
        };
        debug!("Streaming media {} as {}", id, media_file.attachment_name);
        return attachment(file, len, &media_file.attachment_name);
    }

    match packager.prepare(item_type, id).await {
        Ok(file_name) => file_name.into_response(),
        Err(e) => packager_error_response(e),
    }
}

async fn download(
    _session: Session,
    State(packager): State<GuardedPackager>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let Some(file_name) = query.file else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match packager.fetch(&file_name).await {
        Ok(artifact) => attachment(artifact.file, artifact.len, &artifact.file_name),
        Err(e) => packager_error_response(e),
    }
}

async fn current_log_files(state: &ServerState) -> Vec<LogFile> {
    match &state.config.log_dir {
        Some(dir) => list_log_files(dir).await,
        None => Vec::new(),
    }
}

async fn get_logfile_list(
    _session: Session,
    State(state): State<ServerState>,
) -> Result<Json<Vec<LogFile>>, StatusCode> {
    ensure_feature(state.config.features.logs)?;
    Ok(Json(current_log_files(&state).await))
}

/// Only files currently listed by `/logfile-list` can be fetched.
async fn download_logfile(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    if let Err(status) = ensure_feature(state.config.features.logs) {
        return status.into_response();
    }
    let Some(path) = query.file else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !current_log_files(&state).await.iter().any(|log| log.path == path) {
        debug!("Refusing log download of {}", path);
        return StatusCode::FORBIDDEN.into_response();
    }

    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) => return packager_error_response(e.into()),
    };
    let len = match file.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(e) => return packager_error_response(e.into()),
    };
    let file_name = std::path::Path::new(&path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    attachment(file, len, &file_name)
}

// =============================================================================
// Router
// =============================================================================

pub fn make_download_routes(state: ServerState) -> Router {
    Router::new()
        .route("/prepare-download", get(prepare_download))
        .route("/download", get(download))
        .route("/logfile-list", get(get_logfile_list))
        .route("/download-logfile", get(download_logfile))
        .with_state(state)
}

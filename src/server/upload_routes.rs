//! Media upload from a paired client into the upload directory.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use crate::pairing::Session;
use crate::server::state::ServerState;

/// Uploads are media files, well past the default body limit.
const MAX_UPLOAD_BYTES: usize = 1 << 30;

/// Last path component of a client supplied file name, if it is usable.
fn upload_file_name(original: &str) -> Option<String> {
    let name = Path::new(original.trim())
        .file_name()?
        .to_string_lossy()
        .to_string();
    if name.is_empty() || name.starts_with('.') {
        return None;
    }
    Some(name)
}

/// Write a field to `<dir>/.<name>.part` then move it in place.
async fn store_field(
    dir: &Path,
    name: &str,
    field: &mut axum::extract::multipart::Field<'_>,
) -> Result<PathBuf, StatusCode> {
    fs::create_dir_all(dir).await.map_err(|e| {
        error!("Cannot create upload directory {:?}: {}", dir, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let target = dir.join(name);
    let partial = dir.join(format!(".{}.part", name));
    let mut file = fs::File::create(&partial).await.map_err(|e| {
        error!("Cannot create {:?}: {}", partial, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let written = async {
        while let Some(chunk) = field.chunk().await.map_err(|e| {
            debug!("Upload interrupted: {}", e);
            StatusCode::BAD_REQUEST
        })? {
            file.write_all(&chunk).await.map_err(|e| {
                error!("Cannot write {:?}: {}", partial, e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
        }
        file.flush().await.map_err(|e| {
            error!("Cannot flush {:?}: {}", partial, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }
    .await;
    if let Err(status) = written {
        let _ = fs::remove_file(&partial).await;
        return Err(status);
    }

    fs::rename(&partial, &target).await.map_err(|e| {
        error!("Cannot move upload to {:?}: {}", target, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(target)
}

/// Text fields describe the upload, the file field is stored under its own
/// name. Answers `400` when no usable file was sent.
async fn post_upload_media(
    _session: Session,
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Response {
    let upload_dir = state.config.upload_dir.clone();
    let mut description = String::new();
    let mut stored: Option<String> = None;

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                debug!("Unreadable upload: {}", e);
                return StatusCode::BAD_REQUEST.into_response();
            }
        };
        match field.file_name().map(str::to_string) {
            Some(original) => {
                let Some(name) = upload_file_name(&original) else {
                    debug!("Refusing upload named {:?}", original);
                    return StatusCode::BAD_REQUEST.into_response();
                };
                match store_field(&upload_dir, &name, &mut field).await {
                    Ok(path) => {
                        info!("Stored upload {:?}", path);
                        stored = Some(name);
                    }
                    Err(status) => return status.into_response(),
                }
            }
            None => match field.text().await {
                Ok(text) => description = text,
                Err(e) => {
                    debug!("Unreadable upload field: {}", e);
                    return StatusCode::BAD_REQUEST.into_response();
                }
            },
        }
    }

    match stored {
        Some(name) => format!("{} is uploaded to 'uploads/{}'", description, name).into_response(),
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}

pub fn make_upload_routes(state: ServerState) -> Router {
    Router::new()
        .route("/upload-media", post(post_upload_media))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

//! One-shot download artifacts.

use crate::library::{ItemType, Media, MediaLibrary};
use rand::Rng;
use rand_distr::Alphanumeric;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const ARTIFACT_SUFFIX_LENGTH: usize = 8;

#[derive(Debug, Error)]
pub enum PackagerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Nothing to download for {0} {1}")]
    NotFound(&'static str, i64),

    #[error("No such artifact: {0}")]
    MissingArtifact(String),

    #[error("Zip creation error: {0}")]
    ZipError(String),

    #[error("Packaging task failed: {0}")]
    Task(String),
}

/// An artifact opened for streaming. The file is already unlinked.
pub struct Artifact {
    pub file_name: String,
    pub file: fs::File,
    pub len: u64,
}

/// A single library media served as it is.
#[derive(Debug)]
pub struct MediaFile {
    pub path: PathBuf,
    pub attachment_name: String,
}

/// Lowercase `text`, keeping alphanumerics and joining the rest with `separator`.
pub fn slugify(text: &str, separator: &str) -> String {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();
    if words.is_empty() {
        "download".to_string()
    } else {
        words.join(separator)
    }
}

fn sanitize_artifact_name(name: &str) -> Result<&str, PackagerError> {
    if name.is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
    {
        return Err(PackagerError::InvalidFilename(name.to_string()));
    }
    Ok(name)
}

/// Builds zip artifacts of library collections into the download directory.
pub struct DownloadPackager {
    library: Arc<dyn MediaLibrary>,
    download_dir: PathBuf,
}

impl DownloadPackager {
    pub fn new(library: Arc<dyn MediaLibrary>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            library,
            download_dir: download_dir.into(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// The file behind a single media and the name to download it as.
    pub fn media_file(&self, id: i64) -> Result<MediaFile, PackagerError> {
        let media = self
            .library
            .media(id)
            .ok_or(PackagerError::NotFound(ItemType::Media.as_str(), id))?;
        let path = media
            .file_path()
            .filter(|p| p.is_file())
            .ok_or(PackagerError::NotFound(ItemType::Media.as_str(), id))?;
        Ok(MediaFile {
            path,
            attachment_name: format!("{}{}", slugify(&media.title, "_"), media.extension()),
        })
    }

    /// Zip every track of a collection and return the artifact's file name.
    pub async fn prepare(&self, item_type: ItemType, id: i64) -> Result<String, PackagerError> {
        let contents = self
            .library
            .collection(item_type, id)
            .ok_or(PackagerError::NotFound(item_type.as_str(), id))?;
        let files: Vec<(String, PathBuf)> = contents
            .tracks
            .iter()
            .enumerate()
            .filter_map(|(index, media)| entry_for(index, media))
            .collect();
        if files.is_empty() {
            return Err(PackagerError::NotFound(item_type.as_str(), id));
        }
        let artwork = self.library.artwork(item_type, id).filter(|p| p.is_file());

        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(ARTIFACT_SUFFIX_LENGTH)
            .map(|c| char::from(c).to_ascii_lowercase())
            .collect();
        let file_name = format!("{}_{}.zip", slugify(&contents.title, "_"), suffix);

        fs::create_dir_all(&self.download_dir).await?;
        let destination = self.download_dir.join(&file_name);
        let download_dir = self.download_dir.clone();
        let count = files.len();
        tokio::task::spawn_blocking(move || {
            write_zip(&download_dir, &destination, &files, artwork.as_deref())
        })
        .await
        .map_err(|e| PackagerError::Task(e.to_string()))??;

        info!("Prepared download {} with {} files", file_name, count);
        Ok(file_name)
    }

    /// Open a prepared artifact and remove it, so it can be fetched once.
    pub async fn fetch(&self, file_name: &str) -> Result<Artifact, PackagerError> {
        let file_name = sanitize_artifact_name(file_name)?;
        let path = self.download_dir.join(file_name);
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PackagerError::MissingArtifact(file_name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(PackagerError::MissingArtifact(file_name.to_string()));
        }
        match fs::remove_file(&path).await {
            Ok(()) => {}
            // Another request served it first
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PackagerError::MissingArtifact(file_name.to_string()))
            }
            Err(e) => return Err(e.into()),
        }
        debug!("Serving and removing artifact {}", file_name);
        Ok(Artifact {
            file_name: file_name.to_string(),
            file,
            len: metadata.len(),
        })
    }
}

fn entry_for(index: usize, media: &Media) -> Option<(String, PathBuf)> {
    let path = media.file_path().filter(|p| p.is_file())?;
    let name = format!(
        "{:02} - {}{}",
        index + 1,
        slugify(&media.title, "_"),
        media.extension()
    );
    Some((name, path))
}

/// Writes through a temporary file in the same directory, renamed into place
/// once complete.
fn write_zip(
    dir: &Path,
    destination: &Path,
    files: &[(String, PathBuf)],
    artwork: Option<&Path>,
) -> Result<(), PackagerError> {
    let zip_error = |e: zip::result::ZipError| PackagerError::ZipError(e.to_string());

    let temp = NamedTempFile::new_in(dir)?;
    let mut zip = ZipWriter::new(temp.reopen()?);
    // Media files are already compressed
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for (name, path) in files {
        zip.start_file(name.as_str(), options).map_err(zip_error)?;
        let mut source = std::fs::File::open(path)?;
        std::io::copy(&mut source, &mut zip)?;
    }
    if let Some(artwork) = artwork {
        let extension = artwork
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        zip.start_file(format!("cover.{}", extension), options)
            .map_err(zip_error)?;
        zip.write_all(&std::fs::read(artwork)?)?;
    }
    zip.finish().map_err(zip_error)?;

    temp.persist(destination).map_err(|e| PackagerError::Io(e.error))?;
    Ok(())
}

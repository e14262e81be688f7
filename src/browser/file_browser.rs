use super::{BrowserEntry, BrowserProvider, Dataset, Description, EntryKind};
use crate::library::{file_uri, uri_path, FileCategory};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lists one local directory, given as a `file://` URI.
pub struct FileBrowserProvider {
    url: String,
}

impl FileBrowserProvider {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

async fn read_directory(dir: &Path) -> std::io::Result<Vec<BrowserEntry>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(item) = reader.next_entry().await? {
        let name = item.file_name().to_string_lossy().to_string();
        if is_hidden(&name) {
            continue;
        }
        let path = item.path();
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!("Skipping {:?}: {}", path, e);
                continue;
            }
        };
        let uri = file_uri(&path);
        if metadata.is_dir() {
            entries.push(BrowserEntry::directory(&uri, &name));
        } else {
            let size = Description::Size(metadata.len()).format();
            entries.push(
                BrowserEntry::file(&uri, &name, FileCategory::from_path(&path))
                    .with_description(&size),
            );
        }
    }
    // Directories first, then by name
    entries.sort_by(|a, b| {
        b.is_directory()
            .cmp(&a.is_directory())
            .then_with(|| a.file_name.to_lowercase().cmp(&b.file_name.to_lowercase()))
    });
    Ok(entries)
}

/// Folder counts for local directories, sizes for local files.
pub async fn describe_local(entry: &BrowserEntry) -> Option<Description> {
    let path = uri_path(&entry.uri)?;
    match entry.kind {
        EntryKind::Directory => {
            let mut reader = match tokio::fs::read_dir(&path).await {
                Ok(reader) => reader,
                Err(e) => {
                    warn!("Cannot describe {:?}: {}", path, e);
                    return None;
                }
            };
            let mut folders = 0;
            let mut files = 0;
            while let Ok(Some(item)) = reader.next_entry().await {
                if is_hidden(&item.file_name().to_string_lossy()) {
                    continue;
                }
                match item.file_type().await {
                    Ok(t) if t.is_dir() => folders += 1,
                    Ok(_) if FileCategory::from_path(&item.path()).is_media() => files += 1,
                    _ => {}
                }
            }
            Some(Description::Counts { folders, files })
        }
        EntryKind::File(_) => match tokio::fs::metadata(&path).await {
            Ok(metadata) => Some(Description::Size(metadata.len())),
            Err(e) => {
                warn!("Cannot read size of {:?}: {}", path, e);
                None
            }
        },
    }
}

#[async_trait]
impl BrowserProvider for FileBrowserProvider {
    fn url(&self) -> Option<&str> {
        Some(&self.url)
    }

    fn prefers_file_names(&self) -> bool {
        self.url.starts_with("file://")
    }

    async fn list_items(&self, dataset: Arc<Dataset>) {
        match uri_path(&self.url) {
            Some(dir) => match read_directory(&dir).await {
                Ok(entries) => dataset.extend(entries),
                Err(e) => warn!("Failed to list {:?}: {}", dir, e),
            },
            None => warn!("Unsupported browse location {}", self.url),
        }
        dataset.mark_settled();
    }
}

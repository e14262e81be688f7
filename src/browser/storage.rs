use super::{BrowserEntry, BrowserProvider, Dataset};
use crate::library::file_uri;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Lists the configured storage roots that are currently mounted.
pub struct StorageProvider {
    roots: Vec<PathBuf>,
}

impl StorageProvider {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

/// Display label of a storage root.
pub fn storage_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| root.display().to_string())
}

#[async_trait]
impl BrowserProvider for StorageProvider {
    fn url(&self) -> Option<&str> {
        None
    }

    async fn list_items(&self, dataset: Arc<Dataset>) {
        for root in &self.roots {
            if tokio::fs::metadata(root)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false)
            {
                dataset.push(BrowserEntry::directory(&file_uri(root), &storage_name(root)));
            } else {
                debug!("Storage {:?} is not available", root);
            }
        }
        dataset.mark_settled();
    }
}

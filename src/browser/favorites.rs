use super::{BrowserEntry, BrowserProvider, Dataset};
use crate::library::{file_uri, uri_path};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Lists the user's favorite browsing locations.
///
/// Favorites are stored as local paths or URIs. Local ones are shown only
/// while they exist, remote ones always.
pub struct FavoritesProvider {
    favorites: Vec<String>,
}

impl FavoritesProvider {
    pub fn new(favorites: Vec<String>) -> Self {
        Self { favorites }
    }
}

fn to_uri(favorite: &str) -> String {
    if favorite.contains("://") {
        favorite.to_string()
    } else {
        file_uri(Path::new(favorite))
    }
}

fn title_of(uri: &str) -> String {
    let trimmed = uri.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    urlencoding::decode(last)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| last.to_string())
}

#[async_trait]
impl BrowserProvider for FavoritesProvider {
    fn url(&self) -> Option<&str> {
        None
    }

    async fn list_items(&self, dataset: Arc<Dataset>) {
        for favorite in &self.favorites {
            let uri = to_uri(favorite);
            if let Some(path) = uri_path(&uri) {
                if !tokio::fs::metadata(&path)
                    .await
                    .map(|m| m.is_dir())
                    .unwrap_or(false)
                {
                    continue;
                }
            }
            let mut entry = BrowserEntry::directory(&uri, &title_of(&uri));
            entry.favorite = true;
            dataset.push(entry);
        }
        dataset.mark_settled();
    }
}

//! File and network browsing routes.
//!
//! Listings wait a bounded time for their provider, then descriptions that
//! arrive late are published as `browser-description` events.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::debug;

use super::session::ensure_feature;
use super::state::ServerState;
use crate::browser::{
    load_listing, storage_name, BrowserEntry, BrowserProvider, DescribeMode, EntryKind,
    FavoritesProvider, FileBrowserProvider, NetworkProvider, StorageProvider, FAVORITES_ID_PREFIX,
    NETWORK_ID_PREFIX, STORAGE_ID_PREFIX,
};
use crate::events::Event;
use crate::items::{normalize, BreadcrumbItem, BrowsingResult, Entity, PlayQueueItem};
use crate::library::{file_uri, uri_path, MediaLibrary};
use crate::pairing::Session;

#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    pub path: Option<String>,
}

/// Normalize provider entries, giving the ones without a library record a
/// positional id that no library record in the same listing uses.
fn entry_items(
    entries: &[BrowserEntry],
    id_prefix: i64,
    use_file_name: bool,
    library: Option<&dyn MediaLibrary>,
) -> Vec<PlayQueueItem> {
    let library_medias: Vec<_> = entries
        .iter()
        .map(|entry| match (entry.kind, library) {
            (EntryKind::File(category), Some(library)) if category.is_media() => {
                library.media_by_uri(&entry.uri)
            }
            _ => None,
        })
        .collect();
    let used: HashSet<i64> = library_medias.iter().flatten().map(|m| m.id).collect();

    let mut next_id = id_prefix;
    entries
        .iter()
        .zip(&library_medias)
        .map(|(entry, library_media)| {
            while used.contains(&next_id) {
                next_id += 1;
            }
            let synthetic_id = next_id;
            next_id += 1;
            normalize(Entity::Entry {
                entry,
                synthetic_id,
                use_file_name,
                library_media: library_media.as_ref(),
            })
        })
        .collect()
}

/// Breadcrumbs for a browsed location, starting with "Home".
///
/// Local paths get one segment per component. When the path lies under a
/// configured storage root, the root is one segment labelled with the
/// storage name and the components above it are left out.
pub fn breadcrumbs(path: &str, storages: &[PathBuf]) -> Vec<BreadcrumbItem> {
    let mut crumbs = vec![BreadcrumbItem::home()];
    let Some(local) = uri_path(path) else {
        let trimmed = path.trim_end_matches('/');
        let title = trimmed.rsplit('/').next().unwrap_or(trimmed);
        crumbs.push(BreadcrumbItem {
            title: title.to_string(),
            path: path.to_string(),
        });
        return crumbs;
    };

    let root = storages
        .iter()
        .filter(|root| local.starts_with(root))
        .max_by_key(|root| root.components().count());
    let mut current = PathBuf::new();
    if let Some(root) = root {
        crumbs.push(BreadcrumbItem {
            title: storage_name(root),
            path: file_uri(root),
        });
        current = root.clone();
    }

    let remaining = match root {
        Some(root) => local.strip_prefix(root).unwrap_or(Path::new("")),
        None => local.as_path(),
    };
    for component in remaining.components() {
        current.push(component);
        if let Component::Normal(name) = component {
            crumbs.push(BreadcrumbItem {
                title: name.to_string_lossy().to_string(),
                path: file_uri(&current),
            });
        }
    }
    crumbs
}

async fn get_storage_list(
    _session: Session,
    State(state): State<ServerState>,
) -> Result<Json<Vec<PlayQueueItem>>, StatusCode> {
    ensure_feature(state.config.features.file_browser)?;
    let timeouts = state.config.timeouts;
    let provider = Arc::new(StorageProvider::new(state.config.browser.storages.clone()));
    let entries = load_listing(
        provider,
        timeouts.listing,
        DescribeMode::Inline(timeouts.describe),
        &state.event_bus,
    )
    .await;
    Ok(Json(entry_items(&entries, STORAGE_ID_PREFIX, false, None)))
}

async fn get_favorite_list(
    _session: Session,
    State(state): State<ServerState>,
) -> Result<Json<Vec<PlayQueueItem>>, StatusCode> {
    ensure_feature(state.config.features.file_browser)?;
    let timeouts = state.config.timeouts;
    let provider = Arc::new(FavoritesProvider::new(state.config.browser.favorites.clone()));
    let entries = load_listing(
        provider,
        timeouts.listing,
        DescribeMode::Inline(timeouts.describe),
        &state.event_bus,
    )
    .await;
    Ok(Json(entry_items(&entries, FAVORITES_ID_PREFIX, false, None)))
}

async fn get_browse_list(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<BrowsingResult>, StatusCode> {
    ensure_feature(state.config.features.file_browser)?;
    let path = query
        .path
        .filter(|p| !p.is_empty())
        .ok_or(StatusCode::NOT_FOUND)?;

    let provider = Arc::new(FileBrowserProvider::new(&path));
    let use_file_name = provider.prefers_file_names();
    let entries = load_listing(
        provider,
        state.config.timeouts.deep_browse,
        DescribeMode::Deferred,
        &state.event_bus,
    )
    .await;
    debug!("Browsed {} with {} entries", path, entries.len());

    Ok(Json(BrowsingResult {
        content: entry_items(
            &entries,
            STORAGE_ID_PREFIX,
            use_file_name,
            Some(state.library.as_ref()),
        ),
        breadcrumb: breadcrumbs(&path, &state.config.browser.storages),
    }))
}

/// Answers right away; the shares follow as a `network-shares` event.
async fn get_network_list(_session: Session, State(state): State<ServerState>) -> Response {
    if let Err(status) = ensure_feature(state.config.features.network_browser) {
        return status.into_response();
    }
    let provider = Arc::new(NetworkProvider::new(
        state.config.browser.network_shares.clone(),
    ));
    let listing_bound = state.config.timeouts.listing;
    let bus = state.event_bus.clone();
    tokio::spawn(async move {
        let entries = load_listing(provider, listing_bound, DescribeMode::Deferred, &bus).await;
        let shares = entry_items(&entries, NETWORK_ID_PREFIX, false, None);
        debug!("Publishing {} network shares", shares.len());
        bus.publish(Event::NetworkShares { shares });
    });
    (StatusCode::OK, "").into_response()
}

pub fn make_browse_routes(state: ServerState) -> Router {
    Router::new()
        .route("/storage-list", get(get_storage_list))
        .route("/favorite-list", get(get_favorite_list))
        .route("/browse-list", get(get_browse_list))
        .route("/network-list", get(get_network_list))
        .with_state(state)
}

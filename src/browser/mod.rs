//! Content providers for browsable locations.
//!
//! Every provider fills a live [`Dataset`] and can then describe its entries
//! asynchronously. [`load_listing`] drives a provider with bounded waits and
//! routes late descriptions onto the event bus.

mod dataset;
mod favorites;
mod file_browser;
mod network;
mod storage;

pub use dataset::Dataset;
pub use favorites::FavoritesProvider;
pub use file_browser::{describe_local, FileBrowserProvider};
pub use network::NetworkProvider;
pub use storage::{storage_name, StorageProvider};

use crate::events::{Event, EventBus};
use crate::items::{folder_description, format_file_size};
use crate::library::FileCategory;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Synthetic id bases, one per endpoint family.
pub const STORAGE_ID_PREFIX: i64 = 1000;
pub const FAVORITES_ID_PREFIX: i64 = 2000;
pub const NETWORK_ID_PREFIX: i64 = 3000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File(FileCategory),
}

/// One raw provider entry, before normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct BrowserEntry {
    pub uri: String,
    pub title: String,
    pub file_name: String,
    pub kind: EntryKind,
    pub artwork: Option<String>,
    pub description: Option<String>,
    pub favorite: bool,
}

impl BrowserEntry {
    pub fn directory(uri: &str, title: &str) -> Self {
        Self {
            uri: uri.to_string(),
            title: title.to_string(),
            file_name: title.to_string(),
            kind: EntryKind::Directory,
            artwork: None,
            description: None,
            favorite: false,
        }
    }

    pub fn file(uri: &str, file_name: &str, category: FileCategory) -> Self {
        Self {
            uri: uri.to_string(),
            title: file_name.to_string(),
            file_name: file_name.to_string(),
            kind: EntryKind::File(category),
            artwork: None,
            description: None,
            favorite: false,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Late per-entry metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Description {
    Counts { folders: usize, files: usize },
    Size(u64),
    Text(String),
}

impl Description {
    pub fn format(&self) -> String {
        match self {
            Description::Counts { folders, files } => folder_description(*folders, *files),
            Description::Size(bytes) => format_file_size(*bytes),
            Description::Text(text) => text.clone(),
        }
    }
}

pub type DescriptionSender = mpsc::UnboundedSender<(usize, Description)>;

#[async_trait]
pub trait BrowserProvider: Send + Sync {
    /// Location being browsed, `None` for root-level providers.
    fn url(&self) -> Option<&str>;

    /// Whether raw file names should be shown instead of entry titles.
    fn prefers_file_names(&self) -> bool {
        false
    }

    /// Push every entry into `dataset`, then mark it settled.
    async fn list_items(&self, dataset: Arc<Dataset>);

    /// Emit `(index, description)` pairs for entries that still lack one.
    async fn describe(&self, entries: Vec<BrowserEntry>, sender: DescriptionSender) {
        for (index, entry) in entries.iter().enumerate() {
            if entry.description.is_some() {
                continue;
            }
            if let Some(description) = describe_local(entry).await {
                if sender.send((index, description)).is_err() {
                    break;
                }
            }
        }
    }
}

/// How descriptions reach the client.
#[derive(Clone, Copy, Debug)]
pub enum DescribeMode {
    /// Embed whatever resolves within the bound, publish the rest.
    Inline(Duration),
    /// Publish every description on the bus.
    Deferred,
}

/// Run a provider listing with a bounded wait, then start enrichment.
///
/// A listing that does not settle in time is returned partially. The
/// response never waits for descriptions beyond the inline bound.
pub async fn load_listing(
    provider: Arc<dyn BrowserProvider>,
    listing_bound: Duration,
    mode: DescribeMode,
    bus: &EventBus,
) -> Vec<BrowserEntry> {
    let dataset = Dataset::new();
    {
        let provider = provider.clone();
        let dataset = dataset.clone();
        tokio::spawn(async move { provider.list_items(dataset).await });
    }
    if !dataset.wait_settled(listing_bound).await {
        warn!(
            "Listing of {:?} did not settle within {:?}, returning {} entries",
            provider.url(),
            listing_bound,
            dataset.len()
        );
    }
    let mut entries = dataset.snapshot();

    let (sender, mut receiver) = mpsc::unbounded_channel();
    {
        let provider = provider.clone();
        let to_describe = entries.clone();
        tokio::spawn(async move { provider.describe(to_describe, sender).await });
    }

    if let DescribeMode::Inline(bound) = mode {
        let deadline = Instant::now() + bound;
        loop {
            match tokio::time::timeout_at(deadline, receiver.recv()).await {
                Ok(Some((index, description))) => {
                    if let Some(entry) = entries.get_mut(index) {
                        entry.description = Some(description.format());
                    }
                }
                // Every description resolved in time
                Ok(None) => return entries,
                Err(_) => {
                    debug!("Describe bound elapsed, remaining descriptions go through the bus");
                    break;
                }
            }
        }
    }

    let uris: Vec<String> = entries.iter().map(|e| e.uri.clone()).collect();
    let bus = bus.clone();
    tokio::spawn(async move {
        while let Some((index, description)) = receiver.recv().await {
            let text = description.format();
            if text.is_empty() {
                continue;
            }
            if let Some(uri) = uris.get(index) {
                bus.publish(Event::BrowserDescription {
                    path: uri.clone(),
                    description: text,
                });
            }
        }
    });

    entries
}

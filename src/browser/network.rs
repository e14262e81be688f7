use super::{BrowserEntry, BrowserProvider, Dataset, DescriptionSender};
use async_trait::async_trait;
use std::sync::Arc;

/// Reports the network shares known to the player.
///
/// Discovery itself belongs to the player. The gateway only relays the
/// shares it was configured with, one directory entry per share.
pub struct NetworkProvider {
    shares: Vec<String>,
}

impl NetworkProvider {
    pub fn new(shares: Vec<String>) -> Self {
        Self { shares }
    }
}

/// `smb://nas/music` is shown as `music (nas)`, a bare host as itself.
fn share_title(uri: &str) -> String {
    let rest = uri.split_once("://").map(|(_, r)| r).unwrap_or(uri);
    let rest = rest.trim_end_matches('/');
    match rest.split_once('/') {
        Some((host, path)) => {
            let name = path.rsplit('/').next().unwrap_or(path);
            format!("{} ({})", name, host)
        }
        None => rest.to_string(),
    }
}

#[async_trait]
impl BrowserProvider for NetworkProvider {
    fn url(&self) -> Option<&str> {
        None
    }

    async fn list_items(&self, dataset: Arc<Dataset>) {
        dataset.extend(
            self.shares
                .iter()
                .map(|share| BrowserEntry::directory(share, &share_title(share))),
        );
        dataset.mark_settled();
    }

    // Remote shares cannot be counted from here.
    async fn describe(&self, _entries: Vec<BrowserEntry>, _sender: DescriptionSender) {}
}

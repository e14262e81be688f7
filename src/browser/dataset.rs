use super::BrowserEntry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// Live list a provider fills while the request waits on it.
pub struct Dataset {
    items: Mutex<Vec<BrowserEntry>>,
    settled: watch::Sender<bool>,
}

impl Dataset {
    pub fn new() -> Arc<Self> {
        let (settled, _) = watch::channel(false);
        Arc::new(Self {
            items: Mutex::new(Vec::new()),
            settled,
        })
    }

    fn items(&self) -> MutexGuard<'_, Vec<BrowserEntry>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, entry: BrowserEntry) {
        self.items().push(entry);
    }

    pub fn extend(&self, entries: impl IntoIterator<Item = BrowserEntry>) {
        self.items().extend(entries);
    }

    pub fn mark_settled(&self) {
        self.settled.send_replace(true);
    }

    pub fn is_settled(&self) -> bool {
        *self.settled.borrow()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn snapshot(&self) -> Vec<BrowserEntry> {
        self.items().clone()
    }

    /// Returns false if the bound elapsed first.
    pub async fn wait_settled(&self, bound: Duration) -> bool {
        let mut receiver = self.settled.subscribe();
        let settled = matches!(
            tokio::time::timeout(bound, receiver.wait_for(|settled| *settled)).await,
            Ok(Ok(_))
        );
        settled
    }
}

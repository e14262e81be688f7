use super::Event;
use crate::config::EventSettings;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;
use tracing::{debug, warn};

/// A published event with its position in the global publication order.
#[derive(Clone, Debug)]
pub struct Envelope {
    pub seq: u64,
    pub event: Event,
}

struct QueueState {
    next_seq: u64,
    queue: VecDeque<Envelope>,
}

struct Inner {
    state: Mutex<QueueState>,
    sender: broadcast::Sender<Envelope>,
    settings: EventSettings,
}

/// Single producer path for state changes.
///
/// Every published event goes both to the multicast point, consumed by
/// WebSocket connections and waiting long-polls, and to the bounded queue
/// long-poll requests drain.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    pub fn new(settings: EventSettings) -> Self {
        let (sender, _) = broadcast::channel(settings.broadcast_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState {
                    next_seq: 0,
                    queue: VecDeque::new(),
                }),
                sender,
                settings,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Never blocks. Queue order and multicast order are the same because
    /// both happen under the queue lock.
    pub fn publish(&self, event: Event) {
        let mut state = self.state();
        let seq = state.next_seq;
        state.next_seq += 1;

        if self.inner.settings.coalesce_snapshots && !event.is_browser_description() {
            let type_name = event.type_name();
            state.queue.retain(|e| e.event.type_name() != type_name);
        }
        if state.queue.len() >= self.inner.settings.queue_capacity {
            if let Some(dropped) = state.queue.pop_front() {
                warn!(
                    "Event queue full, dropping oldest {} event",
                    dropped.event.type_name()
                );
            }
        }

        let envelope = Envelope { seq, event };
        state.queue.push_back(envelope.clone());
        // No subscriber is not an error, the queue still holds the event
        let _ = self.inner.sender.send(envelope);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.inner.sender.subscribe()
    }

    /// Atomically remove every queued event.
    pub fn drain(&self) -> Vec<Event> {
        self.state().queue.drain(..).map(|e| e.event).collect()
    }

    /// Remove exactly the event published with `seq`, if still queued.
    pub fn take(&self, seq: u64) -> Option<Event> {
        let mut state = self.state();
        let position = state.queue.iter().position(|e| e.seq == seq)?;
        state.queue.remove(position).map(|e| e.event)
    }

    pub fn queued_len(&self) -> usize {
        self.state().queue.len()
    }

    /// Wait for events on behalf of a long-poll request.
    ///
    /// Returns `None` when the timeout elapses with nothing to deliver; the
    /// caller answers with a fresh snapshot then.
    pub async fn long_poll(&self, timeout: Duration) -> Option<Vec<Event>> {
        // Subscribe before draining so nothing published in between is missed
        let mut receiver = self.subscribe();
        let drained = self.drain();
        if !drained.is_empty() {
            return Some(drained);
        }

        let deadline = Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, receiver.recv()).await {
                Err(_) => return None,
                Ok(Ok(envelope)) if envelope.event.is_browser_description() => {
                    if let Some(event) = self.take(envelope.seq) {
                        return Some(vec![event]);
                    }
                    debug!("Description {} already delivered, waiting", envelope.seq);
                }
                Ok(Ok(_)) | Ok(Err(RecvError::Lagged(_))) => {
                    let drained = self.drain();
                    if !drained.is_empty() {
                        return Some(drained);
                    }
                }
                Ok(Err(RecvError::Closed)) => return None,
            }
        }
    }
}

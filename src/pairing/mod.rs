//! Pairing of remote clients with the player.
//!
//! The player shows a one-time code on its own screen; a remote client that
//! types it in gets a session. Authenticated clients can then obtain
//! short-lived tickets to open a WebSocket.

mod challenge;
mod session_store;
mod ticket;

pub use challenge::{ChallengeStore, PairingChallenge};
pub use session_store::{SessionStore, SessionToken};
pub use ticket::{TicketStore, TICKET_LENGTH};

use crate::config::PairingSettings;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PairingError {
    #[error("Invalid or expired pairing code")]
    InvalidCode,
}

/// Proof that the caller is authenticated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// `None` when authentication is bypassed.
    pub token: Option<String>,
}

struct Stores {
    challenges: ChallengeStore,
    sessions: SessionStore,
    tickets: TicketStore,
}

pub struct PairingManager {
    stores: Mutex<Stores>,
    display: watch::Sender<Option<String>>,
}

impl PairingManager {
    pub fn new(settings: PairingSettings) -> Self {
        let (display, _) = watch::channel(None);
        Self {
            stores: Mutex::new(Stores {
                challenges: ChallengeStore::new(settings.code_ttl),
                sessions: SessionStore::new(settings.session_ttl),
                tickets: TicketStore::new(settings.ticket_ttl),
            }),
            display,
        }
    }

    fn stores(&self) -> MutexGuard<'_, Stores> {
        self.stores.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Code currently meant to be shown on the player's screen, `None` once
    /// cleared by a successful pairing.
    pub fn display_updates(&self) -> watch::Receiver<Option<String>> {
        self.display.subscribe()
    }

    pub fn issue_challenge(&self, previous: Option<&str>) -> PairingChallenge {
        let challenge = self.stores().challenges.issue(previous);
        info!("New pairing code issued");
        self.display.send_replace(Some(challenge.code.clone()));
        challenge
    }

    pub fn verify_code(&self, code: &str) -> Result<Session, PairingError> {
        let token = {
            let mut stores = self.stores();
            if !stores.challenges.verify(code) {
                debug!("Rejected pairing code");
                return Err(PairingError::InvalidCode);
            }
            stores.sessions.create()
        };
        info!("Remote client paired");
        self.display.send_replace(None);
        Ok(Session {
            token: Some(token.0),
        })
    }

    pub fn is_session_valid(&self, token: &str) -> bool {
        self.stores().sessions.is_valid(token)
    }

    pub fn revoke_session(&self, token: &str) -> bool {
        self.stores().sessions.revoke(token)
    }

    /// Only reachable with a [`Session`], which the auth guard hands out.
    pub fn issue_ws_ticket(&self, _session: &Session) -> String {
        self.stores().tickets.issue()
    }

    pub fn consume_ws_ticket(&self, ticket: &str) -> bool {
        self.stores().tickets.consume(ticket)
    }
}

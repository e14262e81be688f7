use rand::Rng;
use rand_distr::Alphanumeric;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const TICKET_LENGTH: usize = 45;

/// Single-use tickets letting a WebSocket prove it belongs to a session.
pub struct TicketStore {
    tickets: HashMap<String, Instant>,
    ttl: Duration,
}

impl TicketStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tickets: HashMap::new(),
            ttl,
        }
    }

    pub fn issue(&mut self) -> String {
        let now = Instant::now();
        self.tickets.retain(|_, expires_at| *expires_at > now);
        let ticket: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(TICKET_LENGTH)
            .map(char::from)
            .collect();
        self.tickets.insert(ticket.clone(), now + self.ttl);
        ticket
    }

    /// True only for the first use of a live ticket.
    pub fn consume(&mut self, ticket: &str) -> bool {
        match self.tickets.remove(ticket) {
            Some(expires_at) => expires_at > Instant::now(),
            None => false,
        }
    }
}

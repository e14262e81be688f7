use rand::Rng;
use rand_distr::Alphanumeric;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn generate() -> SessionToken {
        let rng = rand::rng();
        let random_string: String = rng
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();
        SessionToken(random_string)
    }
}

/// Sessions established by a successful pairing.
pub struct SessionStore {
    sessions: HashMap<String, Instant>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
        }
    }

    pub fn create(&mut self) -> SessionToken {
        let token = SessionToken::generate();
        self.sessions
            .insert(token.0.clone(), Instant::now() + self.ttl);
        token
    }

    /// Expired sessions are dropped on lookup.
    pub fn is_valid(&mut self, token: &str) -> bool {
        match self.sessions.get(token) {
            Some(expires_at) if *expires_at > Instant::now() => true,
            Some(_) => {
                self.sessions.remove(token);
                false
            }
            None => false,
        }
    }

    pub fn revoke(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }
}

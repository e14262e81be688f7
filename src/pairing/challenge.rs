use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

const CODE_DIGITS: u32 = 4;
/// Codes shown at once. Issuing past it drops the oldest.
pub const MAX_LIVE_CODES: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingChallenge {
    pub challenge_token: String,
    pub code: String,
}

struct LiveCode {
    code: String,
    expires_at: Instant,
    serial: u64,
}

/// Live one-time codes, at most one per challenge token.
pub struct ChallengeStore {
    codes: HashMap<String, LiveCode>,
    ttl: Duration,
    issued: u64,
}

impl ChallengeStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            codes: HashMap::new(),
            ttl,
            issued: 0,
        }
    }

    fn purge_expired(&mut self) {
        let now = Instant::now();
        self.codes.retain(|_, live| live.expires_at > now);
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .codes
            .iter()
            .min_by_key(|(_, live)| live.serial)
            .map(|(token, _)| token.clone());
        if let Some(token) = oldest {
            self.codes.remove(&token);
        }
    }

    fn generate_code(&self) -> String {
        let mut rng = rand::rng();
        let max = 10u32.pow(CODE_DIGITS);
        loop {
            let code = format!("{:0width$}", rng.random_range(0..max), width = CODE_DIGITS as usize);
            if !self.codes.values().any(|live| live.code == code) {
                return code;
            }
        }
    }

    /// Issue a fresh code, invalidating the one bound to `previous` if any.
    pub fn issue(&mut self, previous: Option<&str>) -> PairingChallenge {
        self.purge_expired();
        if let Some(previous) = previous {
            self.codes.remove(previous);
        }
        while self.codes.len() >= MAX_LIVE_CODES {
            self.evict_oldest();
        }
        let code = self.generate_code();
        let challenge_token = uuid::Uuid::new_v4().to_string();
        self.issued += 1;
        self.codes.insert(
            challenge_token.clone(),
            LiveCode {
                code: code.clone(),
                expires_at: Instant::now() + self.ttl,
                serial: self.issued,
            },
        );
        PairingChallenge {
            challenge_token,
            code,
        }
    }

    /// Consume a live code. Unknown or expired codes are left untouched.
    pub fn verify(&mut self, code: &str) -> bool {
        self.purge_expired();
        let token = self
            .codes
            .iter()
            .find(|(_, live)| live.code == code)
            .map(|(token, _)| token.clone());
        match token {
            Some(token) => {
                self.codes.remove(&token);
                true
            }
            None => false,
        }
    }

    pub fn code_for(&mut self, challenge_token: &str) -> Option<String> {
        self.purge_expired();
        self.codes.get(challenge_token).map(|live| live.code.clone())
    }

    pub fn live_count(&mut self) -> usize {
        self.purge_expired();
        self.codes.len()
    }
}

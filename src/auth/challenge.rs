//! Single-use captcha challenges bound to the caller's session.

use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheStore;

// No ambiguous glyphs (0/O, 1/l) so the rendered phrase stays typeable.
const ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";
const PHRASE_LENGTH: usize = 5;

fn phrase_key(session_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"captcha_");
    hasher.update(session_key.as_bytes());
    let digest = hasher.finalize();
    let mut key = String::with_capacity(8 + digest.len() * 2);
    key.push_str("captcha_");
    for byte in digest {
        key.push_str(&format!("{byte:02x}"));
    }
    key
}

#[derive(Clone)]
pub struct ChallengeService {
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ChallengeService {
    #[must_use]
    pub fn new(cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Issue a fresh phrase for the session, replacing any previous one.
    pub fn issue(&self, session_key: &str) -> String {
        let mut rng = rand::thread_rng();
        let phrase: String = (0..PHRASE_LENGTH)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        self.cache.put(&phrase_key(session_key), &phrase, self.ttl);
        phrase
    }

    /// Compare the answer against the stored phrase, case-insensitively.
    ///
    /// The phrase is consumed on any verification attempt, pass or fail, so a
    /// rejected answer cannot be replayed against the same phrase.
    pub fn verify(&self, session_key: &str, answer: &str) -> bool {
        let key = phrase_key(session_key);
        let Some(phrase) = self.cache.get(&key) else {
            return false;
        };
        self.cache.remove(&key);
        phrase.eq_ignore_ascii_case(answer.trim())
    }
}

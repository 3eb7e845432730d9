//! Failed-login counting and mail cooldown, keyed by client address.

use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheStore;

/// Stable cache key for an address; the raw address never becomes a key.
fn address_key(prefix: &str, address: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(address.as_bytes());
    let digest = hasher.finalize();
    let mut key = String::with_capacity(prefix.len() + digest.len() * 2);
    key.push_str(prefix);
    for byte in digest {
        key.push_str(&format!("{byte:02x}"));
    }
    key
}

/// Consecutive failed-login counter with a fixed expiry window.
#[derive(Clone)]
pub struct AttemptThrottle {
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl AttemptThrottle {
    #[must_use]
    pub fn new(cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Bump the counter for the address, renewing its expiry, and return the
    /// new count. Atomic per key across concurrent requests.
    pub fn record_failure(&self, address: &str) -> u64 {
        self.cache
            .increment(&address_key("login_fails_", address), self.ttl)
    }

    /// Read without mutation.
    #[must_use]
    pub fn current_count(&self, address: &str) -> u64 {
        self.cache
            .get(&address_key("login_fails_", address))
            .and_then(|value| value.parse().ok())
            .unwrap_or(0)
    }

    /// Remove the counter entirely; called on a successful login.
    pub fn clear(&self, address: &str) {
        self.cache.remove(&address_key("login_fails_", address));
    }
}

/// Cooldown gate for outbound recovery mail.
#[derive(Clone)]
pub struct MailGate {
    cache: Arc<dyn CacheStore>,
    cooldown: Duration,
}

impl MailGate {
    #[must_use]
    pub fn new(cache: Arc<dyn CacheStore>, cooldown: Duration) -> Self {
        Self { cache, cooldown }
    }

    /// Atomically reserve the send slot for this address. Two concurrent
    /// requests inside the window see exactly one `true`.
    pub fn try_reserve(&self, address: &str) -> bool {
        self.cache
            .put_if_absent(&address_key("last_mail_", address), "1", self.cooldown)
    }

    /// Give the slot back after a failed dispatch so the sender can retry.
    pub fn release(&self, address: &str) {
        self.cache.remove(&address_key("last_mail_", address));
    }
}

//! Shared TTL key-value cache.
//!
//! Throttle counters, mail-cooldown markers, captcha phrases, sessions, and
//! token revocations all live here. Implementations must make `increment` and
//! `put_if_absent` atomic per key; callers never compose them from separate
//! reads and writes.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn put(&self, key: &str, value: &str, ttl: Duration);

    /// Store only when the key is absent; returns whether the write happened.
    fn put_if_absent(&self, key: &str, value: &str, ttl: Duration) -> bool;

    /// Atomically bump a counter, renewing its expiry, and return the new value.
    fn increment(&self, key: &str, ttl: Duration) -> u64;

    fn remove(&self, key: &str);
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn live(&self) -> bool {
        self.expires_at > Instant::now()
    }
}

/// Process-local cache. A deployment sharing state across processes swaps in
/// a store backed by an external atomic key-value service.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().expect("cache poisoned");
        entries.retain(|_, entry| entry.live());
        entries.get(key).map(|entry| entry.value.clone())
    }

    fn put(&self, key: &str, value: &str, ttl: Duration) {
        let mut entries = self.entries.lock().expect("cache poisoned");
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn put_if_absent(&self, key: &str, value: &str, ttl: Duration) -> bool {
        let mut entries = self.entries.lock().expect("cache poisoned");
        entries.retain(|_, entry| entry.live());
        if entries.contains_key(key) {
            return false;
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        true
    }

    fn increment(&self, key: &str, ttl: Duration) -> u64 {
        let mut entries = self.entries.lock().expect("cache poisoned");
        entries.retain(|_, entry| entry.live());
        let count = entries
            .get(key)
            .and_then(|entry| entry.value.parse::<u64>().ok())
            .unwrap_or(0)
            .saturating_add(1);
        entries.insert(
            key.to_string(),
            Entry {
                value: count.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        count
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().expect("cache poisoned");
        entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn put_and_get_round_trip() {
        let cache = MemoryCache::new();
        cache.put("key", "value", TTL);
        assert_eq!(cache.get("key").as_deref(), Some("value"));
        cache.remove("key");
        assert_eq!(cache.get("key"), None);
    }

    #[test]
    fn entries_expire() {
        let cache = MemoryCache::new();
        cache.put("key", "value", Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("key"), None);
    }

    #[test]
    fn increment_counts_from_one() {
        let cache = MemoryCache::new();
        assert_eq!(cache.increment("fails", TTL), 1);
        assert_eq!(cache.increment("fails", TTL), 2);
        assert_eq!(cache.increment("fails", TTL), 3);
        assert_eq!(cache.get("fails").as_deref(), Some("3"));
    }

    #[test]
    fn put_if_absent_reserves_once() {
        let cache = MemoryCache::new();
        assert!(cache.put_if_absent("marker", "1", TTL));
        assert!(!cache.put_if_absent("marker", "2", TTL));
        assert_eq!(cache.get("marker").as_deref(), Some("1"));
    }

    #[test]
    fn put_if_absent_succeeds_after_expiry() {
        let cache = MemoryCache::new();
        assert!(cache.put_if_absent("marker", "1", Duration::from_millis(5)));
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.put_if_absent("marker", "2", TTL));
    }

    #[test]
    fn concurrent_increments_are_serialized() {
        let cache = std::sync::Arc::new(MemoryCache::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    cache.increment("fails", TTL);
                }
            }));
        }
        for handle in handles {
            handle.join().expect("increment thread panicked");
        }
        assert_eq!(cache.get("fails").as_deref(), Some("800"));
    }
}

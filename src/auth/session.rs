//! Cookie-session issuance over the shared cache.
//!
//! The raw token is only handed back to set the cookie; the cache stores a
//! SHA-256 digest of it, never the raw value.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheStore;

fn session_key(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    let mut key = String::with_capacity(8 + digest.len() * 2);
    key.push_str("session_");
    for byte in digest {
        key.push_str(&format!("{byte:02x}"));
    }
    key
}

fn generate_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Session collaborator: "establish a session for account X" as an explicit
/// side effect, not ambient state.
#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Establish an authenticated session and return the raw cookie token.
    ///
    /// # Errors
    /// Returns an error if token generation fails.
    pub fn establish(&self, uid: i64) -> Result<String> {
        let token = generate_token()?;
        self.cache
            .put(&session_key(&token), &uid.to_string(), self.ttl);
        Ok(token)
    }

    /// Resolve a presented cookie token to its account id.
    #[must_use]
    pub fn current(&self, token: &str) -> Option<i64> {
        self.cache
            .get(&session_key(token))
            .and_then(|value| value.parse().ok())
    }

    /// Drop the session; revocation is idempotent.
    pub fn revoke(&self, token: &str) {
        self.cache.remove(&session_key(token));
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryCache::new()), Duration::from_secs(60))
    }

    #[test]
    fn establish_then_resolve() -> Result<()> {
        let sessions = store();
        let token = sessions.establish(42)?;
        assert_eq!(sessions.current(&token), Some(42));
        Ok(())
    }

    #[test]
    fn revoke_is_idempotent() -> Result<()> {
        let sessions = store();
        let token = sessions.establish(42)?;
        sessions.revoke(&token);
        sessions.revoke(&token);
        assert_eq!(sessions.current(&token), None);
        Ok(())
    }

    #[test]
    fn unknown_tokens_resolve_to_nothing() {
        let sessions = store();
        assert_eq!(sessions.current("made-up-token"), None);
    }

    #[test]
    fn sessions_expire() -> Result<()> {
        let sessions = SessionStore::new(Arc::new(MemoryCache::new()), Duration::from_millis(5));
        let token = sessions.establish(42)?;
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(sessions.current(&token), None);
        Ok(())
    }
}

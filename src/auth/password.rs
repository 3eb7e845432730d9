//! One-way credential hashing.

use anyhow::{anyhow, Context, Result};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};

/// Hash a plaintext credential into an argon2 PHC string.
///
/// # Errors
/// Returns an error if salt generation or hashing fails.
pub fn hash(password: &str) -> Result<String> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate salt")?;
    let salt =
        SaltString::encode_b64(&bytes).map_err(|err| anyhow!("failed to encode salt: {err}"))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hashed| hashed.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Verify a plaintext credential against a stored PHC string.
///
/// Unparseable stored hashes verify as false rather than erroring; a corrupt
/// row must not read as a valid credential.
#[must_use]
pub fn verify(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|hash| {
        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok()
    })
}

/// Random opaque credential for externally-verified accounts. The raw value
/// is hashed and discarded; nobody ever types it.
///
/// # Errors
/// Returns an error if random generation fails.
pub fn random_password() -> Result<String> {
    let mut bytes = [0u8; 24];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate random password")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() -> Result<()> {
        let hashed = hash("12345678")?;
        assert!(verify("12345678", &hashed));
        assert!(!verify("wrong-password", &hashed));
        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> Result<()> {
        assert_ne!(hash("12345678")?, hash("12345678")?);
        Ok(())
    }

    #[test]
    fn corrupt_stored_hash_never_verifies() {
        assert!(!verify("12345678", "not-a-phc-string"));
        assert!(!verify("12345678", ""));
    }

    #[test]
    fn random_passwords_differ() -> Result<()> {
        assert_ne!(random_password()?, random_password()?);
        Ok(())
    }
}

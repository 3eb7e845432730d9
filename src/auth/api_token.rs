//! Stateless bearer tokens for the public API.
//!
//! A narrower sibling of the cookie-session login: same identity resolution
//! and credential verification, but no throttle and no events, and the
//! artifact is a signed, expiring token. Logout revokes the token id for the
//! remainder of its life; refresh mints a new token instead of extending the
//! old one.

use secrecy::ExposeSecret;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::identity::normalize_email;
use crate::auth::password;
use crate::auth::signed::{self, TokenClaims, ACTION_API, TOKEN_VERSION};
use crate::auth::state::AuthState;

fn revocation_key(jti: &str) -> String {
    format!("revoked_{jti}")
}

fn issue(state: &AuthState, uid: i64) -> Result<String, AuthError> {
    let now = state.now();
    let claims = TokenClaims {
        v: TOKEN_VERSION,
        sub: uid,
        act: ACTION_API.to_string(),
        iat: now,
        exp: now + state.config().api_token_ttl_seconds(),
        jti: Uuid::new_v4().to_string(),
    };
    signed::sign_hs256(state.config().secret().expose_secret().as_bytes(), &claims)
        .map_err(|err| AuthError::Internal(anyhow::anyhow!("failed to sign bearer token: {err}")))
}

fn verify(state: &AuthState, token: &str) -> Option<TokenClaims> {
    let claims = signed::verify_hs256(
        token,
        state.config().secret().expose_secret().as_bytes(),
        ACTION_API,
        state.now(),
    )
    .ok()?;
    if state.cache().get(&revocation_key(&claims.jti)).is_some() {
        return None;
    }
    Some(claims)
}

fn revoke(state: &AuthState, claims: &TokenClaims) {
    let remaining = (claims.exp - state.now()).max(1) as u64;
    state.cache().put(
        &revocation_key(&claims.jti),
        "1",
        Duration::from_secs(remaining),
    );
}

/// Exchange an email and credential for a bearer token.
///
/// A lenient public contract: authentication failures return `Ok(None)`
/// rather than an error, and the counter-based throttle is not consulted.
///
/// # Errors
/// Only store failures error out.
pub async fn login(
    state: &AuthState,
    email: &str,
    raw_password: &str,
) -> Result<Option<String>, AuthError> {
    let email = normalize_email(email);
    let Some(user) = state.users().find_by_email(&email).await? else {
        return Ok(None);
    };
    if !password::verify(raw_password, &user.password) {
        return Ok(None);
    }
    Ok(Some(issue(state, user.uid)?))
}

/// Invalidate the token's future acceptance. Always succeeds; presenting an
/// invalid token is indistinguishable from presenting a spent one.
pub fn logout(state: &AuthState, token: &str) {
    if let Some(claims) = verify(state, token) {
        revoke(state, &claims);
    }
}

/// Trade a still-valid token for a fresh one. The presented token is revoked
/// so a captured copy cannot be refreshed twice.
///
/// # Errors
/// `Capability` when the presented token is expired, revoked, or forged.
pub fn refresh(state: &AuthState, token: &str) -> Result<String, AuthError> {
    let claims = verify(state, token).ok_or(AuthError::Capability)?;
    revoke(state, &claims);
    issue(state, claims.sub)
}

/// Resolve a presented bearer token to its account id, for API guards.
#[must_use]
pub fn authenticate(state: &AuthState, token: &str) -> Option<i64> {
    verify(state, token).map(|claims| claims.sub)
}

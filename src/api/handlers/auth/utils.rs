//! Cookie and client-address helpers shared by the auth handlers.

use axum::http::{
    header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};
use axum::response::{IntoResponse, Response};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::auth::AuthError;

use super::types::Envelope;

pub(crate) const SESSION_COOKIE_NAME: &str = "vesti_session";
pub(crate) const GUEST_COOKIE_NAME: &str = "vesti_sid";

/// Extract a client IP from common proxy headers.
pub(crate) fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Address key for throttle and cooldown state; a stable placeholder keeps
/// direct connections without proxy headers on a single shared budget.
pub(crate) fn client_address(headers: &HeaderMap) -> String {
    extract_client_ip(headers).unwrap_or_else(|| "unknown".to_string())
}

pub(crate) fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name {
            return Some(val.to_string());
        }
    }
    None
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Challenge phrases are bound to this key; a caller without the guest
/// cookie has no phrase to answer.
pub(crate) fn guest_session_key(headers: &HeaderMap) -> String {
    extract_cookie(headers, GUEST_COOKIE_NAME).unwrap_or_default()
}

fn cookie_value(
    name: &str,
    value: &str,
    max_age: u64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Secure `HttpOnly` cookie carrying the session token.
pub(crate) fn session_cookie(
    token: &str,
    ttl_seconds: u64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie_value(SESSION_COOKIE_NAME, token, ttl_seconds, secure)
}

pub(crate) fn clear_session_cookie(secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie_value(SESSION_COOKIE_NAME, "", 0, secure)
}

pub(crate) fn guest_cookie(
    session_key: &str,
    ttl_seconds: u64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie_value(GUEST_COOKIE_NAME, session_key, ttl_seconds, secure)
}

/// Laravel-style field-scoped validation response.
pub(crate) fn validation_response(field: &str, message: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "message": message,
            "errors": { field: [message] },
        })),
    )
        .into_response()
}

/// Fallback mapping for error variants a handler does not match itself.
pub(crate) fn fallback_error_response(err: &AuthError) -> Response {
    match err {
        AuthError::Validation { field, message } => validation_response(field, message),
        AuthError::Internal(inner) => {
            error!("request failed: {inner:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(Envelope::new(-1, "Internal server error.")),
            )
                .into_response()
        }
        other => (
            StatusCode::OK,
            Json(Envelope::new(1, other.to_string())),
        )
            .into_response(),
    }
}

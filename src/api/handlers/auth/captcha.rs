//! Captcha issuance endpoint.
//!
//! The phrase is stored against the caller's guest-session cookie and
//! rendered as an SVG; presentation beyond that is the frontend's concern.

use axum::{
    extract::Extension,
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
};
use std::sync::Arc;
use ulid::Ulid;

use crate::auth::AuthState;

use super::utils::{extract_cookie, guest_cookie, GUEST_COOKIE_NAME};

fn render_svg(phrase: &str) -> String {
    // Per-glyph jitter and rotation, deterministic per position.
    let glyphs: String = phrase
        .chars()
        .enumerate()
        .map(|(index, glyph)| {
            let x = 14 + index * 18;
            let y = 23 + ((index * 7) % 5);
            let rotate = ((index * 11) % 21) as i32 - 10;
            format!(
                "<text x=\"{x}\" y=\"{y}\" transform=\"rotate({rotate} {x} {y})\" \
                 font-family=\"monospace\" font-size=\"20\" fill=\"#444\">{glyph}</text>"
            )
        })
        .collect();
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100\" height=\"34\">\
         <rect width=\"100%\" height=\"100%\" fill=\"#f2f2f2\"/>{glyphs}</svg>"
    )
}

#[utoipa::path(
    get,
    path = "/auth/captcha",
    responses(
        (status = 200, description = "Captcha image bound to the caller's session", content_type = "image/svg+xml"),
    ),
    tag = "auth"
)]
pub async fn handle_captcha(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let mut response_headers = HeaderMap::new();

    let session_key = match extract_cookie(&headers, GUEST_COOKIE_NAME) {
        Some(existing) => existing,
        None => {
            let fresh = Ulid::new().to_string();
            let secure = auth_state.config().base_url().starts_with("https://");
            let ttl = auth_state.config().session_ttl_seconds();
            if let Ok(cookie) = guest_cookie(&fresh, ttl, secure) {
                response_headers.insert(SET_COOKIE, cookie);
            }
            fresh
        }
    };

    let phrase = auth_state.challenges().issue(&session_key);

    response_headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/svg+xml"));
    response_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, private"));
    (StatusCode::OK, response_headers, render_svg(&phrase))
}

//! Session login/logout endpoints.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::auth::{login, AuthError, AuthState};

use super::types::{Envelope, LoginRequest};
use super::utils::{
    clear_session_cookie, client_address, extract_cookie, fallback_error_response,
    guest_session_key, session_cookie, SESSION_COOKIE_NAME,
};

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login outcome envelope", body = Envelope),
        (status = 422, description = "Validation error"),
    ),
    tag = "auth"
)]
pub async fn handle_login(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let address = client_address(&headers);
    let session_key = guest_session_key(&headers);
    let form = login::LoginForm {
        identification: request.identification,
        password: request.password,
        captcha: request.captcha,
    };

    match login::handle_login(&auth_state, &form, &address, &session_key).await {
        Ok(success) => {
            let secure = auth_state.config().base_url().starts_with("https://");
            let ttl = auth_state.config().session_ttl_seconds();
            let mut response_headers = HeaderMap::new();
            if let Ok(cookie) = session_cookie(&success.session_token, ttl, secure) {
                response_headers.insert(SET_COOKIE, cookie);
            }
            (
                StatusCode::OK,
                response_headers,
                Json(Envelope::new(0, "Logged in successfully.")),
            )
                .into_response()
        }
        Err(AuthError::UnknownUser) => (
            StatusCode::OK,
            Json(Envelope::new(2, AuthError::UnknownUser.to_string())),
        )
            .into_response(),
        Err(AuthError::WrongPassword { fails }) => (
            StatusCode::OK,
            Json(Envelope::with_data(
                1,
                AuthError::WrongPassword { fails }.to_string(),
                json!({ "login_fails": fails }),
            )),
        )
            .into_response(),
        Err(err) => fallback_error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session cleared", body = Envelope),
    ),
    tag = "auth"
)]
pub async fn handle_logout(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    if let Some(token) = extract_cookie(&headers, SESSION_COOKIE_NAME) {
        if let Some(uid) = auth_state.sessions().current(&token) {
            match auth_state.users().find_by_uid(uid).await {
                Ok(Some(user)) => login::handle_logout(&auth_state, &user, &token),
                // A stale session for a deleted account is just dropped.
                Ok(None) => auth_state.sessions().revoke(&token),
                Err(err) => {
                    return fallback_error_response(&AuthError::Internal(err));
                }
            }
        }
    }

    // Always clear the cookie, even if the session record was missing.
    let secure = auth_state.config().base_url().starts_with("https://");
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(secure) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (
        StatusCode::OK,
        response_headers,
        Json(Envelope::new(0, "You have been logged out.")),
    )
        .into_response()
}

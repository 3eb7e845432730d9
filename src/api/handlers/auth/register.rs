//! Registration endpoint.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::auth::{register, AuthError, AuthState};

use super::types::{Envelope, RegisterRequest};
use super::utils::{client_address, fallback_error_response, guest_session_key, session_cookie};

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registration outcome envelope", body = Envelope),
        (status = 422, description = "Validation error"),
    ),
    tag = "auth"
)]
pub async fn handle_register(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let address = client_address(&headers);
    let session_key = guest_session_key(&headers);
    let form = register::RegistrationForm {
        email: request.email,
        password: request.password,
        nickname: request.nickname,
        player_name: request.player_name,
        captcha: request.captcha,
    };

    match register::handle_register(&auth_state, &form, &address, &session_key).await {
        Ok(success) => {
            // Registration chains straight into the login success path.
            let secure = auth_state.config().base_url().starts_with("https://");
            let ttl = auth_state.config().session_ttl_seconds();
            let mut response_headers = HeaderMap::new();
            if let Ok(cookie) = session_cookie(&success.session_token, ttl, secure) {
                response_headers.insert(SET_COOKIE, cookie);
            }
            (
                StatusCode::OK,
                response_headers,
                Json(Envelope::new(0, "Registered successfully.")),
            )
                .into_response()
        }
        Err(AuthError::Closed(message) | AuthError::RateLimited(message)) => {
            (StatusCode::OK, Json(Envelope::new(7, message))).into_response()
        }
        Err(AuthError::Conflict(message)) => {
            (StatusCode::OK, Json(Envelope::new(2, message))).into_response()
        }
        Err(err) => fallback_error_response(&err),
    }
}

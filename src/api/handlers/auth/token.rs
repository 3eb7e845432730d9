//! Stateless bearer-token endpoints for the public API.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::auth::{api_token, AuthState};

use super::types::ApiLoginRequest;
use super::utils::extract_bearer_token;

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = ApiLoginRequest,
    responses(
        (status = 200, description = "Token on success, falsy marker on failure"),
    ),
    tag = "api-token"
)]
pub async fn handle_login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ApiLoginRequest>>,
) -> impl IntoResponse {
    // Lenient public contract: failures are falsy markers, never errors.
    let request: ApiLoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return Json(json!({ "token": false })).into_response(),
    };

    match api_token::login(&auth_state, &request.email, &request.password).await {
        Ok(Some(token)) => Json(json!({ "token": token })).into_response(),
        Ok(None) => Json(json!({ "token": "" })).into_response(),
        Err(err) => {
            error!("api login failed: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Token revoked"),
    ),
    tag = "api-token"
)]
pub async fn handle_logout(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    if let Some(token) = extract_bearer_token(&headers) {
        api_token::logout(&auth_state, &token);
    }
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "Fresh token"),
        (status = 401, description = "Expired, revoked, or forged token"),
    ),
    tag = "api-token"
)]
pub async fn handle_refresh(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response();
    };
    match api_token::refresh(&auth_state, &token) {
        Ok(fresh) => Json(json!({ "token": fresh })).into_response(),
        Err(_) => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response(),
    }
}

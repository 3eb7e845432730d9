//! Password recovery endpoints: request phase and completion phase.

use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::auth::{forgot, AuthError, AuthState};

use super::types::{Envelope, ForgotRequest, ResetRequest, SignedQuery};
use super::utils::{client_address, fallback_error_response, guest_session_key};

#[utoipa::path(
    post,
    path = "/auth/forgot",
    request_body = ForgotRequest,
    responses(
        (status = 200, description = "Recovery outcome envelope", body = Envelope),
        (status = 422, description = "Validation error"),
    ),
    tag = "auth"
)]
pub async fn handle_forgot(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ForgotRequest>>,
) -> impl IntoResponse {
    let request: ForgotRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let address = client_address(&headers);
    let session_key = guest_session_key(&headers);
    let form = forgot::ForgotForm {
        email: request.email,
        captcha: request.captcha,
    };

    match forgot::handle_forgot(&auth_state, &form, &address, &session_key).await {
        Ok(()) => (
            StatusCode::OK,
            Json(Envelope::new(0, "A recovery email is on its way.")),
        )
            .into_response(),
        Err(AuthError::Closed(message)) => {
            (StatusCode::OK, Json(Envelope::new(1, message))).into_response()
        }
        Err(AuthError::UnknownUser) => (
            StatusCode::OK,
            Json(Envelope::new(1, "This email address is not registered.")),
        )
            .into_response(),
        Err(AuthError::RateLimited(message)) => {
            (StatusCode::OK, Json(Envelope::new(2, message))).into_response()
        }
        Err(err @ AuthError::Transport(_)) => {
            (StatusCode::OK, Json(Envelope::new(2, err.to_string()))).into_response()
        }
        Err(err) => fallback_error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/auth/reset/{uid}",
    request_body = ResetRequest,
    params(
        ("uid" = i64, Path, description = "Account id the signed reference is bound to"),
        ("token" = String, Query, description = "Signed recovery reference"),
    ),
    responses(
        (status = 200, description = "Password updated", body = Envelope),
        (status = 403, description = "Invalid or expired reference"),
        (status = 422, description = "Validation error"),
    ),
    tag = "auth"
)]
pub async fn handle_reset(
    Path(uid): Path<i64>,
    query: Query<SignedQuery>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetRequest>>,
) -> impl IntoResponse {
    let request: ResetRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match forgot::handle_reset(&auth_state, uid, &query.token, &request.password).await {
        Ok(()) => (
            StatusCode::OK,
            Json(Envelope::new(0, "Your password has been reset.")),
        )
            .into_response(),
        Err(err @ AuthError::Capability) => {
            (StatusCode::FORBIDDEN, err.to_string()).into_response()
        }
        Err(err) => fallback_error_response(&err),
    }
}

//! Email-verification completion endpoint.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::auth::{forgot, AuthError, AuthState};

use super::types::{Envelope, SignedQuery};
use super::utils::fallback_error_response;

#[utoipa::path(
    get,
    path = "/auth/verify/{uid}",
    params(
        ("uid" = i64, Path, description = "Account id the signed reference is bound to"),
        ("token" = String, Query, description = "Signed verification reference"),
    ),
    responses(
        (status = 200, description = "Account verified", body = Envelope),
        (status = 403, description = "Invalid, expired, or already-used reference"),
    ),
    tag = "auth"
)]
pub async fn handle_verify(
    Path(uid): Path<i64>,
    query: Query<SignedQuery>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    match forgot::handle_verify(&auth_state, uid, &query.token).await {
        Ok(_user) => (
            StatusCode::OK,
            Json(Envelope::new(0, "Your account has been verified.")),
        )
            .into_response(),
        Err(AuthError::Closed(message)) => {
            (StatusCode::OK, Json(Envelope::new(1, message))).into_response()
        }
        Err(err @ AuthError::Capability) => {
            (StatusCode::FORBIDDEN, err.to_string()).into_response()
        }
        Err(err) => fallback_error_response(&err),
    }
}

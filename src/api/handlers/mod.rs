pub mod auth;
pub mod health;

use axum::response::IntoResponse;

/// Plain-text landing route; the real frontend is served elsewhere.
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}

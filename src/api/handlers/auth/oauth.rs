//! External-identity (OAuth) endpoints.

use axum::{
    extract::{Extension, Path, Query},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::IntoParams;

use crate::auth::{oauth, AuthState};

use super::utils::{client_address, session_cookie};

#[derive(IntoParams, Debug, Deserialize)]
#[into_params(parameter_in = Query)]
pub struct CallbackArgs {
    code: String,
}

#[utoipa::path(
    get,
    path = "/auth/login/{provider}",
    params(
        ("provider" = String, Path, description = "External login provider name"),
    ),
    responses(
        (status = 307, description = "Redirect to the provider's authorization page"),
        (status = 500, description = "Unknown provider"),
    ),
    tag = "oauth"
)]
pub async fn handle_redirect(
    Path(provider): Path<String>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let Some(provider) = auth_state.provider(&provider) else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unsupported external login provider".to_string(),
        )
            .into_response();
    };
    let redirect_uri = format!(
        "{}/auth/login/{}/callback",
        auth_state.config().base_url(),
        provider.name()
    );
    Redirect::temporary(&provider.authorize_url(&redirect_uri)).into_response()
}

#[utoipa::path(
    get,
    path = "/auth/login/{provider}/callback",
    params(
        ("provider" = String, Path, description = "External login provider name"),
        CallbackArgs,
    ),
    responses(
        (status = 303, description = "Authenticated; redirected to the user area"),
        (status = 500, description = "Provider error or unsupported profile"),
    ),
    tag = "oauth"
)]
pub async fn handle_callback(
    Path(provider): Path<String>,
    query: Query<CallbackArgs>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let address = client_address(&headers);
    match oauth::handle_callback(&auth_state, &provider, &query.code, &address).await {
        Ok(success) => {
            let secure = auth_state.config().base_url().starts_with("https://");
            let ttl = auth_state.config().session_ttl_seconds();
            let mut response_headers = HeaderMap::new();
            if let Ok(cookie) = session_cookie(&success.session_token, ttl, secure) {
                response_headers.insert(SET_COOKIE, cookie);
            }
            (response_headers, Redirect::to("/user")).into_response()
        }
        Err(err) => {
            // Missing email or an unknown provider must fail loudly.
            error!("external login failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unsupported external login".to_string(),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oauth::ExternalProfile;
    use crate::auth::test_support::{test_state, StaticProvider};
    use std::sync::Arc;

    #[tokio::test]
    async fn redirect_for_unknown_provider_is_a_loud_failure() {
        let state = Arc::new(test_state());
        let response = handle_redirect(Path("gitlab".to_string()), Extension(state))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn redirect_targets_the_provider() {
        let state = Arc::new(test_state().with_provider(Arc::new(StaticProvider::with_profile(
            "github",
            ExternalProfile {
                email: Some("a@b.c".to_string()),
                nickname: "abc".to_string(),
            },
        ))));
        let response = handle_redirect(Path("github".to_string()), Extension(state))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response
            .headers()
            .get(axum::http::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert!(location.contains("callback"));
    }

    #[tokio::test]
    async fn callback_without_email_is_a_server_error() {
        let state = Arc::new(test_state().with_provider(Arc::new(StaticProvider::with_profile(
            "github",
            ExternalProfile {
                email: None,
                nickname: "abc".to_string(),
            },
        ))));
        let response = handle_callback(
            Path("github".to_string()),
            Query(CallbackArgs {
                code: "code".to_string(),
            }),
            HeaderMap::new(),
            Extension(state),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn callback_sets_the_session_cookie() {
        let state = Arc::new(test_state().with_provider(Arc::new(StaticProvider::with_profile(
            "github",
            ExternalProfile {
                email: Some("a@b.c".to_string()),
                nickname: "abc".to_string(),
            },
        ))));
        let response = handle_callback(
            Path("github".to_string()),
            Query(CallbackArgs {
                code: "code".to_string(),
            }),
            HeaderMap::new(),
            Extension(state),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.headers().get(SET_COOKIE).is_some());
    }
}

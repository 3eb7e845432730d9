use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::account::{MemoryUserRepo, PgUserRepo, UserRepo};
use crate::auth::{oauth::ExternalProvider, AuthConfig, AuthState};
use crate::cache::MemoryCache;
use crate::mail::Mailer;

pub mod handlers;
mod openapi;

pub use openapi::ApiDoc;

/// Build the full application router around a constructed auth state.
#[must_use]
pub fn router(auth_state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route(
            "/health",
            get(handlers::health::health).options(handlers::health::health),
        )
        .route("/auth/login", post(handlers::auth::login::handle_login))
        .route("/auth/logout", post(handlers::auth::login::handle_logout))
        .route(
            "/auth/register",
            post(handlers::auth::register::handle_register),
        )
        .route("/auth/forgot", post(handlers::auth::forgot::handle_forgot))
        .route(
            "/auth/reset/:uid",
            post(handlers::auth::forgot::handle_reset),
        )
        .route(
            "/auth/verify/:uid",
            get(handlers::auth::verify::handle_verify),
        )
        .route(
            "/auth/captcha",
            get(handlers::auth::captcha::handle_captcha),
        )
        .route(
            "/auth/login/:provider",
            get(handlers::auth::oauth::handle_redirect),
        )
        .route(
            "/auth/login/:provider/callback",
            get(handlers::auth::oauth::handle_callback),
        )
        .route(
            "/api/auth/login",
            post(handlers::auth::token::handle_login),
        )
        .route(
            "/api/auth/logout",
            post(handlers::auth::token::handle_logout),
        )
        .route(
            "/api/auth/refresh",
            post(handlers::auth::token::handle_refresh),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(auth_state)),
        )
}

/// Start the server.
/// # Errors
/// Return error if the store cannot be reached or the server fails to start.
pub async fn new(
    port: u16,
    dsn: String,
    config: AuthConfig,
    mailer: Arc<dyn Mailer>,
    providers: Vec<Arc<dyn ExternalProvider>>,
) -> Result<()> {
    let users: Arc<dyn UserRepo> = if dsn.starts_with("memory:") {
        // Dev/demo backend; all state lives in the process.
        Arc::new(MemoryUserRepo::new())
    } else {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(&dsn)
            .await
            .context("Failed to connect to database")?;
        let repo = PgUserRepo::new(pool);
        repo.migrate().await?;
        Arc::new(repo)
    };

    let cors = cors_layer(config.base_url())?;

    let mut auth_state = AuthState::new(config, users, Arc::new(MemoryCache::new()), mailer);
    for provider in providers {
        auth_state = auth_state.with_provider(provider);
    }

    let app = router(Arc::new(auth_state)).layer(cors);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn cors_layer(base_url: &str) -> Result<CorsLayer> {
    let origin = site_origin(base_url)?;
    Ok(CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true))
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn site_origin(base_url: &str) -> Result<HeaderValue> {
    let parsed =
        Url::parse(base_url).with_context(|| format!("Invalid site base URL: {base_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Site base URL must include a valid host: {base_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build site origin header")
}

//! OpenAPI document assembly; served by Swagger UI at `/swagger-ui`.

use utoipa::OpenApi;

use super::handlers::{auth, health};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::login::handle_login,
        auth::login::handle_logout,
        auth::register::handle_register,
        auth::forgot::handle_forgot,
        auth::forgot::handle_reset,
        auth::verify::handle_verify,
        auth::captcha::handle_captcha,
        auth::oauth::handle_redirect,
        auth::oauth::handle_callback,
        auth::token::handle_login,
        auth::token::handle_logout,
        auth::token::handle_refresh,
    ),
    components(schemas(
        health::Health,
        auth::types::Envelope,
        auth::types::LoginRequest,
        auth::types::RegisterRequest,
        auth::types::ForgotRequest,
        auth::types::ResetRequest,
        auth::types::SignedQuery,
        auth::types::ApiLoginRequest,
    )),
    tags(
        (name = "auth", description = "Login, registration, and recovery"),
        (name = "oauth", description = "External-identity login"),
        (name = "api-token", description = "Stateless bearer tokens"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

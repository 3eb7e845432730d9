use crate::api;
use crate::auth::{oauth::ExternalProvider, AuthConfig, MemoryOptions, Options};
use crate::mail::{LogMailer, Mailer, WebhookMailer};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub base_url: String,
    pub secret: String,
    pub session_ttl_seconds: u64,
    pub reset_ttl_seconds: i64,
    pub api_token_ttl_seconds: i64,
    pub throttle_ttl_seconds: u64,
    pub mail_cooldown_seconds: u64,
    pub site_options: Vec<(String, String)>,
    pub mail_endpoint: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_sender: Option<String>,
    pub github_client_id: Option<String>,
    pub github_client_secret: Option<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the store cannot be reached or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let options = Arc::new(MemoryOptions::new());
    for (key, value) in &args.site_options {
        options.set(key, value);
    }

    // Recovery mail follows the transport: configured endpoint -> enabled.
    let mailer: Arc<dyn Mailer> = match (args.mail_endpoint, args.mail_api_key, args.mail_sender) {
        (Some(endpoint), Some(api_key), Some(sender)) => {
            options.set("mail_enabled", "true");
            Arc::new(WebhookMailer::new(
                endpoint,
                SecretString::from(api_key),
                sender,
            ))
        }
        _ => {
            if options.get("mail_enabled").is_none() {
                warn!("No mail transport configured; password recovery is disabled");
            }
            Arc::new(LogMailer)
        }
    };

    let config = AuthConfig::new(
        options,
        args.base_url,
        SecretString::from(args.secret),
    )
    .with_session_ttl_seconds(args.session_ttl_seconds)
    .with_reset_ttl_seconds(args.reset_ttl_seconds)
    .with_api_token_ttl_seconds(args.api_token_ttl_seconds)
    .with_throttle_ttl_seconds(args.throttle_ttl_seconds)
    .with_mail_cooldown_seconds(args.mail_cooldown_seconds);

    let mut providers: Vec<Arc<dyn ExternalProvider>> = Vec::new();
    if let (Some(client_id), Some(client_secret)) =
        (args.github_client_id, args.github_client_secret)
    {
        providers.push(Arc::new(crate::auth::oauth::GitHubProvider::new(
            client_id,
            SecretString::from(client_secret),
        )));
    }

    api::new(args.port, args.dsn, config, mailer, providers).await
}

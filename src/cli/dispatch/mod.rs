//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the
//! appropriate action, such as starting the API server with its full
//! configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, mail, oauth};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    // Cross-argument requirements (mail transport, provider pairing).
    crate::cli::commands::validate(matches).map_err(|e| anyhow::anyhow!(e))?;

    let auth_opts = auth::Options::parse(matches)?;
    let mail_opts = mail::Options::parse(matches);
    let oauth_opts = oauth::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        dsn,
        base_url: auth_opts.base_url,
        secret: auth_opts.secret,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        reset_ttl_seconds: auth_opts.reset_ttl_seconds,
        api_token_ttl_seconds: auth_opts.api_token_ttl_seconds,
        throttle_ttl_seconds: auth_opts.throttle_ttl_seconds,
        mail_cooldown_seconds: auth_opts.mail_cooldown_seconds,
        site_options: auth_opts.site_options,
        mail_endpoint: mail_opts.endpoint,
        mail_api_key: mail_opts.api_key,
        mail_sender: mail_opts.sender,
        github_client_id: oauth_opts.github_client_id,
        github_client_secret: oauth_opts.github_client_secret,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;

    #[test]
    fn secret_required() {
        temp_env::with_vars(
            [
                ("VESTI_SECRET", None::<&str>),
                ("VESTI_DSN", Some("memory:")),
            ],
            || {
                let command = crate::cli::commands::new();
                let result = command.try_get_matches_from(vec!["vesti"]);
                assert!(result.is_err());
            },
        );
    }

    #[test]
    fn handler_builds_server_args() -> Result<()> {
        temp_env::with_vars(
            [
                ("VESTI_MAIL_ENDPOINT", None::<&str>),
                ("VESTI_GITHUB_CLIENT_ID", None::<&str>),
                ("VESTI_GITHUB_CLIENT_SECRET", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "vesti",
                    "--dsn",
                    "memory:",
                    "--secret",
                    "signing-secret",
                    "--base-url",
                    "https://skins.example.test",
                ]);
                let Action::Server(args) = handler(&matches)?;
                assert_eq!(args.port, 8080);
                assert_eq!(args.dsn, "memory:");
                assert_eq!(args.base_url, "https://skins.example.test");
                assert_eq!(args.secret, "signing-secret");
                assert!(args.mail_endpoint.is_none());
                assert!(args.github_client_id.is_none());
                Ok(())
            },
        )
    }
}

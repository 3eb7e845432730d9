//! Site and token arguments.

use anyhow::{Context, Result};
use clap::{Arg, Command};

pub const ARG_BASE_URL: &str = "base-url";
pub const ARG_SECRET: &str = "secret";
pub const ARG_SESSION_TTL: &str = "session-ttl-seconds";
pub const ARG_RESET_TTL: &str = "reset-ttl-seconds";
pub const ARG_API_TOKEN_TTL: &str = "api-token-ttl-seconds";
pub const ARG_THROTTLE_TTL: &str = "throttle-ttl-seconds";
pub const ARG_MAIL_COOLDOWN: &str = "mail-cooldown-seconds";
pub const ARG_OPTION: &str = "option";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BASE_URL)
                .long(ARG_BASE_URL)
                .help("Public base URL of this site, used for links and cookies")
                .default_value("http://localhost:8080")
                .env("VESTI_BASE_URL"),
        )
        .arg(
            Arg::new(ARG_SECRET)
                .long(ARG_SECRET)
                .help("Signing secret for sessions, recovery links, and bearer tokens")
                .env("VESTI_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL)
                .long(ARG_SESSION_TTL)
                .help("Cookie session lifetime in seconds")
                .default_value("43200")
                .env("VESTI_SESSION_TTL_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_RESET_TTL)
                .long(ARG_RESET_TTL)
                .help("Recovery/verification link lifetime in seconds")
                .default_value("3600")
                .env("VESTI_RESET_TTL_SECONDS")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_API_TOKEN_TTL)
                .long(ARG_API_TOKEN_TTL)
                .help("API bearer token lifetime in seconds")
                .default_value("900")
                .env("VESTI_API_TOKEN_TTL_SECONDS")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_THROTTLE_TTL)
                .long(ARG_THROTTLE_TTL)
                .help("Failed-login counter window in seconds")
                .default_value("86400")
                .env("VESTI_THROTTLE_TTL_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_MAIL_COOLDOWN)
                .long(ARG_MAIL_COOLDOWN)
                .help("Minimum seconds between recovery emails per address")
                .default_value("60")
                .env("VESTI_MAIL_COOLDOWN_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_OPTION)
                .long(ARG_OPTION)
                .help("Seed a site option as key=value (repeatable)")
                .action(clap::ArgAction::Append),
        )
}

#[derive(Debug)]
pub struct Options {
    pub base_url: String,
    pub secret: String,
    pub session_ttl_seconds: u64,
    pub reset_ttl_seconds: i64,
    pub api_token_ttl_seconds: i64,
    pub throttle_ttl_seconds: u64,
    pub mail_cooldown_seconds: u64,
    pub site_options: Vec<(String, String)>,
}

impl Options {
    /// # Errors
    /// Returns an error if a required argument is missing or a seeded option
    /// is not `key=value`.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let site_options = matches
            .get_many::<String>(ARG_OPTION)
            .unwrap_or_default()
            .map(|raw| {
                raw.split_once('=')
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .with_context(|| format!("invalid --option (expected key=value): {raw}"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            base_url: matches
                .get_one::<String>(ARG_BASE_URL)
                .cloned()
                .context("missing required argument: --base-url")?,
            secret: matches
                .get_one::<String>(ARG_SECRET)
                .cloned()
                .context("missing required argument: --secret")?,
            session_ttl_seconds: matches
                .get_one::<u64>(ARG_SESSION_TTL)
                .copied()
                .unwrap_or(43200),
            reset_ttl_seconds: matches
                .get_one::<i64>(ARG_RESET_TTL)
                .copied()
                .unwrap_or(3600),
            api_token_ttl_seconds: matches
                .get_one::<i64>(ARG_API_TOKEN_TTL)
                .copied()
                .unwrap_or(900),
            throttle_ttl_seconds: matches
                .get_one::<u64>(ARG_THROTTLE_TTL)
                .copied()
                .unwrap_or(86400),
            mail_cooldown_seconds: matches
                .get_one::<u64>(ARG_MAIL_COOLDOWN)
                .copied()
                .unwrap_or(60),
            site_options,
        })
    }
}

//! Outbound mail transport arguments.

use clap::{Arg, Command};

pub const ARG_MAIL_ENDPOINT: &str = "mail-endpoint";
pub const ARG_MAIL_API_KEY: &str = "mail-api-key";
pub const ARG_MAIL_SENDER: &str = "mail-sender";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MAIL_ENDPOINT)
                .long(ARG_MAIL_ENDPOINT)
                .help("Transactional-mail API endpoint; recovery mail is disabled without one")
                .env("VESTI_MAIL_ENDPOINT"),
        )
        .arg(
            Arg::new(ARG_MAIL_API_KEY)
                .long(ARG_MAIL_API_KEY)
                .help("API key for the mail endpoint")
                .env("VESTI_MAIL_API_KEY"),
        )
        .arg(
            Arg::new(ARG_MAIL_SENDER)
                .long(ARG_MAIL_SENDER)
                .help("Sender address for outbound mail")
                .env("VESTI_MAIL_SENDER"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub sender: Option<String>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &clap::ArgMatches) -> Self {
        Self {
            endpoint: matches.get_one::<String>(ARG_MAIL_ENDPOINT).cloned(),
            api_key: matches.get_one::<String>(ARG_MAIL_API_KEY).cloned(),
            sender: matches.get_one::<String>(ARG_MAIL_SENDER).cloned(),
        }
    }
}

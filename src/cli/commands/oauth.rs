//! External-identity provider arguments.

use clap::{Arg, Command};

pub const ARG_GITHUB_CLIENT_ID: &str = "github-client-id";
pub const ARG_GITHUB_CLIENT_SECRET: &str = "github-client-secret";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_GITHUB_CLIENT_ID)
                .long(ARG_GITHUB_CLIENT_ID)
                .help("GitHub OAuth app client id; GitHub login is disabled without one")
                .env("VESTI_GITHUB_CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_GITHUB_CLIENT_SECRET)
                .long(ARG_GITHUB_CLIENT_SECRET)
                .help("GitHub OAuth app client secret")
                .env("VESTI_GITHUB_CLIENT_SECRET"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub github_client_id: Option<String>,
    pub github_client_secret: Option<String>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &clap::ArgMatches) -> Self {
        Self {
            github_client_id: matches.get_one::<String>(ARG_GITHUB_CLIENT_ID).cloned(),
            github_client_secret: matches.get_one::<String>(ARG_GITHUB_CLIENT_SECRET).cloned(),
        }
    }
}

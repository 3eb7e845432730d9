//! # Vesti (Skin-Server Account Engine)
//!
//! `vesti` is the account and authentication backend of a self-hosted game
//! skin server: registration, session login, password recovery, external
//! (OAuth) identities, and stateless API bearer tokens, together with the
//! abuse-prevention layer (failed-login throttle, captcha escalation, mail
//! cooldown) and a synchronous event pipeline external code can subscribe to.
//!
//! ## Abuse prevention
//!
//! Failed logins are counted per client address in a TTL cache; at the
//! configured threshold a captcha is demanded before the credential is even
//! checked, and a successful login clears the counter entirely. Recovery mail
//! is limited to one send per address per cooldown window, reserved
//! atomically so concurrent requests cannot double-send.
//!
//! ## Signed references
//!
//! Recovery links, verification links, and API bearer tokens all use one
//! HS256 signed-reference primitive binding an account id to an intended
//! action and an absolute expiry (zero clock-skew tolerance).
//!
//! ## Events
//!
//! Workflows announce each transition (`login.attempt`, `login.succeeded`,
//! `registration.completed`, ...) on an explicit dispatcher. Subscribers run
//! synchronously in registration order and are advisory: they observe, they
//! cannot veto.

pub mod account;
pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod mail;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

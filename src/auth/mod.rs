//! Account-lifecycle engine: login, registration, recovery, external
//! identities, and API bearer tokens, composed from the collaborators in
//! [`state::AuthState`].

pub mod api_token;
pub mod challenge;
pub mod config;
pub mod error;
pub mod events;
pub mod forgot;
pub mod identity;
pub mod login;
pub mod oauth;
pub mod password;
pub mod register;
pub mod session;
pub mod signed;
pub mod state;
pub mod throttle;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{AuthConfig, MemoryOptions, Options, PlayerNameRule};
pub use error::AuthError;
pub use events::{Dispatcher, EventValue};
pub use state::AuthState;

//! Error taxonomy shared by the auth workflows.

use thiserror::Error;

/// Workflow outcomes a caller can act on.
///
/// Store failures stay `Internal` and propagate as fatal request failures;
/// everything else maps to a user-facing message at the handler layer.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing input, scoped to a single field. Never logged as
    /// a security event.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The identifier resolved to nothing. Distinct from a wrong credential.
    #[error("There is no account matching that identifier.")]
    UnknownUser,

    /// Credential mismatch, carrying the updated failure count.
    #[error("Wrong password. {fails} failed attempt(s) so far.")]
    WrongPassword { fails: u64 },

    /// Throttle exceeded, cooldown active, or registration quota reached.
    #[error("{0}")]
    RateLimited(String),

    /// Duplicate email or player name.
    #[error("{0}")]
    Conflict(String),

    /// The requested feature is disabled by site configuration.
    #[error("{0}")]
    Closed(String),

    /// Mail dispatch failed; the transport message is surfaced verbatim.
    #[error("Failed to send mail: {0}")]
    Transport(String),

    /// Invalid or expired signed reference, rejected uniformly.
    #[error("This link is invalid or has expired.")]
    Capability,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

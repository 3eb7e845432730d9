//! Storage abstraction for accounts and players.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{NewUser, Player, User};

/// Outcome when attempting to create a row guarded by a uniqueness constraint.
#[derive(Debug)]
pub enum CreateOutcome<T> {
    Created(T),
    Conflict,
}

/// Account store shared by the auth workflows and the admin surfaces.
///
/// Implementations are externally synchronized; the workflows never rely on
/// in-process locking around these calls.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_uid(&self, uid: i64) -> Result<Option<User>>;

    /// Exact-equality email lookup on a normalized address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Player lookup by unique display name.
    async fn find_player(&self, name: &str) -> Result<Option<Player>>;

    async fn create_user(&self, new_user: NewUser) -> Result<CreateOutcome<User>>;

    async fn create_player(&self, uid: i64, name: &str) -> Result<CreateOutcome<Player>>;

    /// Number of accounts registered from the given source address.
    async fn registrations_from(&self, ip: &str) -> Result<i64>;

    async fn update_password(&self, uid: i64, password_hash: &str) -> Result<()>;

    async fn set_verified(&self, uid: i64, verified: bool) -> Result<()>;
}

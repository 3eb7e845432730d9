//! Login-identifier resolution.

use anyhow::Result;
use regex::Regex;

use crate::account::{User, UserRepo};

/// How an identifier matched: by email address or by in-game player name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Email,
    PlayerName,
}

impl Channel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::PlayerName => "player-name",
        }
    }
}

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Map an identifier to exactly one account, or none.
///
/// Email exact-equality wins; only when no email matches is the identifier
/// tried as a player display name resolving to the name's owning account.
/// No side effects.
///
/// # Errors
/// Propagates account-store failures.
pub async fn resolve(users: &dyn UserRepo, identifier: &str) -> Result<Option<(User, Channel)>> {
    let normalized = normalize_email(identifier);
    if let Some(user) = users.find_by_email(&normalized).await? {
        return Ok(Some((user, Channel::Email)));
    }

    let Some(player) = users.find_player(identifier.trim()).await? else {
        return Ok(None);
    };
    let Some(uid) = player.uid else {
        // An unclaimed name owns no account.
        return Ok(None);
    };
    Ok(users
        .find_by_uid(uid)
        .await?
        .map(|user| (user, Channel::PlayerName)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{CreateOutcome, MemoryUserRepo, NewUser, Permission};

    async fn seed_user(repo: &MemoryUserRepo, email: &str) -> User {
        let outcome = repo
            .create_user(NewUser {
                email: email.to_string(),
                nickname: "nickname".to_string(),
                password: "hash".to_string(),
                score: 1000,
                permission: Permission::Normal,
                verified: false,
                ip: "1.2.3.4".to_string(),
            })
            .await
            .expect("create_user failed");
        match outcome {
            CreateOutcome::Created(user) => user,
            CreateOutcome::Conflict => panic!("seed conflict"),
        }
    }

    #[tokio::test]
    async fn resolves_by_email_first() -> Result<()> {
        let repo = MemoryUserRepo::new();
        let user = seed_user(&repo, "a@b.c").await;
        let resolved = resolve(&repo, "a@b.c").await?;
        let (resolved, channel) = resolved.expect("should resolve");
        assert_eq!(resolved.uid, user.uid);
        assert_eq!(channel, Channel::Email);
        Ok(())
    }

    #[tokio::test]
    async fn email_lookup_is_normalized() -> Result<()> {
        let repo = MemoryUserRepo::new();
        let user = seed_user(&repo, "a@b.c").await;
        let resolved = resolve(&repo, " A@B.C ").await?;
        assert_eq!(resolved.map(|(user, _)| user.uid), Some(user.uid));
        Ok(())
    }

    #[tokio::test]
    async fn falls_back_to_player_name() -> Result<()> {
        let repo = MemoryUserRepo::new();
        let user = seed_user(&repo, "a@b.c").await;
        repo.create_player(user.uid, "steve").await?;
        let resolved = resolve(&repo, "steve").await?;
        let (resolved, channel) = resolved.expect("should resolve");
        assert_eq!(resolved.uid, user.uid);
        assert_eq!(channel, Channel::PlayerName);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_identifier_resolves_to_none() -> Result<()> {
        let repo = MemoryUserRepo::new();
        seed_user(&repo, "a@b.c").await;
        assert!(resolve(&repo, "nope@nope.net").await?.is_none());
        assert!(resolve(&repo, "unknown-player").await?.is_none());
        Ok(())
    }

    #[test]
    fn valid_email_accepts_and_rejects() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("@missing-local.example"));
    }
}

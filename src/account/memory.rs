//! In-memory account store for development servers and the test suite.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

use super::models::{NewUser, Player, User};
use super::repo::{CreateOutcome, UserRepo};

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    players: HashMap<i64, Player>,
    next_uid: i64,
    next_pid: i64,
}

/// Mutex-guarded maps with the same uniqueness rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryUserRepo {
    inner: Mutex<Inner>,
}

impl MemoryUserRepo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_uid(&self, uid: i64) -> Result<Option<User>> {
        let inner = self.inner.lock().expect("account store poisoned");
        Ok(inner.users.get(&uid).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.lock().expect("account store poisoned");
        Ok(inner
            .users
            .values()
            .find(|user| !user.email.is_empty() && user.email == email)
            .cloned())
    }

    async fn find_player(&self, name: &str) -> Result<Option<Player>> {
        let inner = self.inner.lock().expect("account store poisoned");
        Ok(inner
            .players
            .values()
            .find(|player| player.name == name)
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<CreateOutcome<User>> {
        let mut inner = self.inner.lock().expect("account store poisoned");
        if !new_user.email.is_empty()
            && inner.users.values().any(|user| user.email == new_user.email)
        {
            return Ok(CreateOutcome::Conflict);
        }
        inner.next_uid += 1;
        let user = User {
            uid: inner.next_uid,
            email: new_user.email,
            nickname: new_user.nickname,
            password: new_user.password,
            score: new_user.score,
            permission: new_user.permission,
            verified: new_user.verified,
            ip: new_user.ip,
            register_at: Utc::now(),
        };
        inner.users.insert(user.uid, user.clone());
        Ok(CreateOutcome::Created(user))
    }

    async fn create_player(&self, uid: i64, name: &str) -> Result<CreateOutcome<Player>> {
        let mut inner = self.inner.lock().expect("account store poisoned");
        if inner.players.values().any(|player| player.name == name) {
            return Ok(CreateOutcome::Conflict);
        }
        inner.next_pid += 1;
        let player = Player {
            pid: inner.next_pid,
            uid: Some(uid),
            name: name.to_string(),
            tid_skin: 0,
            tid_cape: 0,
        };
        inner.players.insert(player.pid, player.clone());
        Ok(CreateOutcome::Created(player))
    }

    async fn registrations_from(&self, ip: &str) -> Result<i64> {
        let inner = self.inner.lock().expect("account store poisoned");
        Ok(inner.users.values().filter(|user| user.ip == ip).count() as i64)
    }

    async fn update_password(&self, uid: i64, password_hash: &str) -> Result<()> {
        let mut inner = self.inner.lock().expect("account store poisoned");
        if let Some(user) = inner.users.get_mut(&uid) {
            user.password = password_hash.to_string();
        }
        Ok(())
    }

    async fn set_verified(&self, uid: i64, verified: bool) -> Result<()> {
        let mut inner = self.inner.lock().expect("account store poisoned");
        if let Some(user) = inner.users.get_mut(&uid) {
            user.verified = verified;
        }
        Ok(())
    }
}

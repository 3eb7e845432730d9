//! Shared fixtures for the auth workflow tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::account::{CreateOutcome, MemoryUserRepo, NewUser, Permission, User};
use crate::auth::config::{AuthConfig, MemoryOptions};
use crate::auth::events::{Dispatcher, EventValue};
use crate::auth::oauth::{ExternalProfile, ExternalProvider};
use crate::auth::password;
use crate::auth::state::AuthState;
use crate::cache::MemoryCache;
use crate::mail::{LogMailer, Mailer, Message};

pub(crate) fn test_state() -> AuthState {
    test_state_with(Arc::new(MemoryOptions::new()), Arc::new(LogMailer))
}

pub(crate) fn test_state_with(
    options: Arc<MemoryOptions>,
    mailer: Arc<dyn Mailer>,
) -> AuthState {
    let config = AuthConfig::new(
        options,
        "https://skins.example.test".to_string(),
        SecretString::from("test-signing-secret"),
    );
    AuthState::new(
        config,
        Arc::new(MemoryUserRepo::new()),
        Arc::new(MemoryCache::new()),
        mailer,
    )
}

pub(crate) async fn seed_user(state: &AuthState, email: &str, raw_password: &str) -> User {
    let outcome = state
        .users()
        .create_user(NewUser {
            email: email.to_string(),
            nickname: "nickname".to_string(),
            password: password::hash(raw_password).expect("hash failed"),
            score: 1000,
            permission: Permission::Normal,
            verified: false,
            ip: "1.2.3.4".to_string(),
        })
        .await
        .expect("create_user failed");
    match outcome {
        CreateOutcome::Created(user) => user,
        CreateOutcome::Conflict => panic!("seed user conflicted"),
    }
}

/// Captures every payload delivered for one event name.
pub(crate) struct Recorder {
    count: Arc<AtomicUsize>,
    payloads: Arc<Mutex<Vec<Vec<EventValue>>>>,
}

impl Recorder {
    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub(crate) fn last(&self) -> Option<Vec<EventValue>> {
        self.payloads
            .lock()
            .expect("recorder poisoned")
            .last()
            .cloned()
    }
}

pub(crate) fn recorder(events: &Dispatcher, name: &str) -> Recorder {
    let count = Arc::new(AtomicUsize::new(0));
    let payloads = Arc::new(Mutex::new(Vec::new()));
    let counter = count.clone();
    let sink = payloads.clone();
    events.on(name, move |payload| {
        counter.fetch_add(1, Ordering::SeqCst);
        sink.lock().expect("recorder poisoned").push(payload.to_vec());
    });
    Recorder { count, payloads }
}

/// Provider returning a fixed profile, standing in for a real service.
pub(crate) struct StaticProvider {
    name: String,
    profile: ExternalProfile,
}

impl StaticProvider {
    pub(crate) fn with_profile(name: &str, profile: ExternalProfile) -> Self {
        Self {
            name: name.to_string(),
            profile,
        }
    }
}

#[async_trait]
impl ExternalProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn authorize_url(&self, redirect_uri: &str) -> String {
        format!("https://provider.test/authorize?redirect_uri={redirect_uri}")
    }

    async fn fetch_profile(&self, _code: &str) -> Result<ExternalProfile> {
        Ok(self.profile.clone())
    }
}

/// Records sent mail instead of delivering it.
#[derive(Clone, Default)]
pub(crate) struct RecordingMailer {
    sent: Arc<Mutex<Vec<Message>>>,
}

impl RecordingMailer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn sent(&self) -> Vec<Message> {
        self.sent.lock().expect("mailer poisoned").clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &Message) -> Result<()> {
        self.sent
            .lock()
            .expect("mailer poisoned")
            .push(message.clone());
        Ok(())
    }
}

/// Fails every send with a fixed transport message.
pub(crate) struct FailingMailer(pub(crate) &'static str);

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: &Message) -> Result<()> {
        Err(anyhow!("{}", self.0))
    }
}

//! Auth state: configuration plus every collaborator the workflows compose.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::account::UserRepo;
use crate::cache::CacheStore;
use crate::mail::Mailer;

use super::challenge::ChallengeService;
use super::config::AuthConfig;
use super::events::Dispatcher;
use super::oauth::ExternalProvider;
use super::session::SessionStore;
use super::throttle::{AttemptThrottle, MailGate};

/// Constructed once per process and injected into every handler; nothing in
/// the workflows reaches for ambient globals.
pub struct AuthState {
    config: AuthConfig,
    users: Arc<dyn UserRepo>,
    cache: Arc<dyn CacheStore>,
    mailer: Arc<dyn Mailer>,
    events: Dispatcher,
    throttle: AttemptThrottle,
    mail_gate: MailGate,
    sessions: SessionStore,
    challenges: ChallengeService,
    providers: HashMap<String, Arc<dyn ExternalProvider>>,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        users: Arc<dyn UserRepo>,
        cache: Arc<dyn CacheStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let throttle = AttemptThrottle::new(
            cache.clone(),
            Duration::from_secs(config.throttle_ttl_seconds()),
        );
        let mail_gate = MailGate::new(
            cache.clone(),
            Duration::from_secs(config.mail_cooldown_seconds()),
        );
        let sessions = SessionStore::new(
            cache.clone(),
            Duration::from_secs(config.session_ttl_seconds()),
        );
        let challenges = ChallengeService::new(
            cache.clone(),
            Duration::from_secs(config.captcha_ttl_seconds()),
        );
        Self {
            config,
            users,
            cache,
            mailer,
            events: Dispatcher::new(),
            throttle,
            mail_gate,
            sessions,
            challenges,
            providers: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ExternalProvider>) -> Self {
        self.providers.insert(provider.name().to_string(), provider);
        self
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserRepo {
        self.users.as_ref()
    }

    #[must_use]
    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.as_ref()
    }

    #[must_use]
    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    #[must_use]
    pub fn events(&self) -> &Dispatcher {
        &self.events
    }

    #[must_use]
    pub fn throttle(&self) -> &AttemptThrottle {
        &self.throttle
    }

    #[must_use]
    pub fn mail_gate(&self) -> &MailGate {
        &self.mail_gate
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn challenges(&self) -> &ChallengeService {
        &self.challenges
    }

    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&dyn ExternalProvider> {
        self.providers.get(name).map(|provider| &**provider)
    }

    /// Current unix time used for token issuance and verification.
    #[must_use]
    pub fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

//! Synchronous event pipeline.
//!
//! One dispatcher is constructed per process and injected into `AuthState`;
//! there is no ambient registry. Subscribers run in registration order and a
//! workflow does not continue past an emission point until every subscriber
//! for it has returned. Subscribers observe; they cannot veto.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::account::User;

pub const LOGIN_ATTEMPT: &str = "login.attempt";
pub const LOGIN_READY: &str = "login.ready";
pub const LOGIN_SUCCEEDED: &str = "login.succeeded";
pub const LOGIN_FAILED: &str = "login.failed";
pub const LOGOUT_BEFORE: &str = "logout.before";
pub const LOGOUT_AFTER: &str = "logout.after";
pub const REGISTRATION_ATTEMPT: &str = "registration.attempt";
pub const REGISTRATION_READY: &str = "registration.ready";
pub const REGISTRATION_COMPLETED: &str = "registration.completed";
pub const FORGOT_ATTEMPT: &str = "forgot.attempt";
pub const FORGOT_READY: &str = "forgot.ready";
pub const FORGOT_SENT: &str = "forgot.sent";
pub const FORGOT_FAILED: &str = "forgot.failed";
pub const RESET_BEFORE: &str = "reset.before";
pub const RESET_AFTER: &str = "reset.after";

/// One element of an event's ordered payload.
#[derive(Clone, Debug)]
pub enum EventValue {
    User(User),
    Str(String),
    Int(i64),
    Data(serde_json::Value),
}

impl EventValue {
    #[must_use]
    pub fn as_user(&self) -> Option<&User> {
        match self {
            Self::User(user) => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }
}

type Handler = Arc<dyn Fn(&[EventValue]) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Dispatcher {
    subscribers: Arc<Mutex<HashMap<String, Vec<Handler>>>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subscriber for the named event.
    pub fn on<F>(&self, name: &str, handler: F)
    where
        F: Fn(&[EventValue]) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.lock().expect("dispatcher poisoned");
        subscribers
            .entry(name.to_string())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Deliver the payload to every subscriber, in registration order.
    pub fn emit(&self, name: &str, payload: &[EventValue]) {
        // Handlers run outside the lock so a subscriber may emit in turn.
        let handlers: Vec<Handler> = {
            let subscribers = self.subscribers.lock().expect("dispatcher poisoned");
            subscribers.get(name).cloned().unwrap_or_default()
        };
        for handler in handlers {
            handler(payload);
        }
    }
}

//! Outbound mail transports.
//!
//! Recovery mail is dispatched synchronously inside the request so the caller
//! learns about transport failures immediately; there is no retry queue.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::info;

#[derive(Clone, Debug)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail delivery abstraction used by the password-recovery workflow.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message or report the transport error to the caller.
    async fn send(&self, message: &Message) -> Result<()>;
}

/// Local dev transport that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &Message) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "mail send stub"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookAddress {
    email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookBody {
    sender: WebhookAddress,
    to: Vec<WebhookAddress>,
    subject: String,
    text_content: String,
}

/// Transactional-mail API transport (Brevo-style JSON POST).
pub struct WebhookMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    sender: String,
}

impl WebhookMailer {
    #[must_use]
    pub fn new(endpoint: String, api_key: SecretString, sender: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            sender,
        }
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send(&self, message: &Message) -> Result<()> {
        let body = WebhookBody {
            sender: WebhookAddress {
                email: self.sender.clone(),
            },
            to: vec![WebhookAddress {
                email: message.to.clone(),
            }],
            subject: message.subject.clone(),
            text_content: message.body.clone(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", self.api_key.expose_secret())
            .header("User-Agent", crate::APP_USER_AGENT)
            .json(&body)
            .send()
            .await
            .context("mail webhook request failed")?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let detail = response.text().await.unwrap_or_default();
        Err(anyhow!("mail webhook returned {status}: {detail}"))
    }
}

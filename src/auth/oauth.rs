//! External-identity (OAuth) login.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::account::{CreateOutcome, NewUser, Permission, User};
use crate::auth::error::AuthError;
use crate::auth::events::{EventValue, REGISTRATION_COMPLETED};
use crate::auth::identity::normalize_email;
use crate::auth::login::{auto_login, LoginSuccess};
use crate::auth::password;
use crate::auth::state::AuthState;

/// Verified profile returned by an external provider.
#[derive(Clone, Debug)]
pub struct ExternalProfile {
    /// Absent when the provider withholds addresses; that is an
    /// unsupported-provider condition, not a silent skip.
    pub email: Option<String>,
    pub nickname: String,
}

/// One concrete implementation per external service, selected by name.
#[async_trait]
pub trait ExternalProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Where to send the user's browser to start the provider's flow.
    fn authorize_url(&self, redirect_uri: &str) -> String;

    /// Exchange the callback code for a verified profile.
    async fn fetch_profile(&self, code: &str) -> Result<ExternalProfile>;
}

#[derive(Debug, Deserialize)]
struct GitHubTokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    email: Option<String>,
    login: String,
    name: Option<String>,
}

pub struct GitHubProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
}

impl GitHubProvider {
    #[must_use]
    pub fn new(client_id: String, client_secret: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
        }
    }
}

#[async_trait]
impl ExternalProvider for GitHubProvider {
    fn name(&self) -> &str {
        "github"
    }

    fn authorize_url(&self, redirect_uri: &str) -> String {
        format!(
            "https://github.com/login/oauth/authorize?client_id={}&redirect_uri={}&scope=user:email",
            self.client_id, redirect_uri
        )
    }

    async fn fetch_profile(&self, code: &str) -> Result<ExternalProfile> {
        let token: GitHubTokenResponse = self
            .client
            .post("https://github.com/login/oauth/access_token")
            .header("Accept", "application/json")
            .header("User-Agent", crate::APP_USER_AGENT)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
                ("code", code),
            ])
            .send()
            .await
            .context("GitHub token exchange failed")?
            .json()
            .await
            .context("GitHub token response was not JSON")?;

        let access_token = token
            .access_token
            .ok_or_else(|| anyhow!("GitHub rejected the authorization code"))?;

        let profile: GitHubUser = self
            .client
            .get("https://api.github.com/user")
            .header("Accept", "application/json")
            .header("User-Agent", crate::APP_USER_AGENT)
            .bearer_auth(access_token)
            .send()
            .await
            .context("GitHub profile request failed")?
            .json()
            .await
            .context("GitHub profile response was not JSON")?;

        let nickname = profile.name.unwrap_or(profile.login);
        Ok(ExternalProfile {
            email: profile.email,
            nickname,
        })
    }
}

/// Complete an external login: exchange the verified profile for a local
/// account, creating one (pre-verified) if absent, then finish with the same
/// success tail as the password login path.
///
/// # Errors
/// Fails loudly when the provider is unknown or the profile carries no email.
pub async fn handle_callback(
    state: &AuthState,
    provider_name: &str,
    code: &str,
    address: &str,
) -> Result<LoginSuccess, AuthError> {
    let provider = state
        .provider(provider_name)
        .ok_or_else(|| AuthError::Internal(anyhow!("Unsupported provider: {provider_name}")))?;

    let profile = provider.fetch_profile(code).await.map_err(AuthError::Internal)?;
    let Some(email) = profile.email else {
        return Err(AuthError::Internal(anyhow!(
            "Unsupported provider: profile carries no email"
        )));
    };
    let email = normalize_email(&email);

    if let Some(user) = state.users().find_by_email(&email).await? {
        let session_token = auto_login(state, &user)?;
        return Ok(LoginSuccess {
            user,
            session_token,
        });
    }

    let user = create_trusted_user(state, &email, &profile.nickname, address).await?;
    state
        .events()
        .emit(REGISTRATION_COMPLETED, &[EventValue::User(user.clone())]);
    let session_token = auto_login(state, &user)?;
    Ok(LoginSuccess {
        user,
        session_token,
    })
}

/// Create an account from a pre-trusted profile, bypassing the normal
/// registration rules other than uniqueness. The provider already verified
/// the identity, so the account starts verified.
async fn create_trusted_user(
    state: &AuthState,
    email: &str,
    nickname: &str,
    address: &str,
) -> Result<User, AuthError> {
    let credential = password::random_password()?;
    let new_user = NewUser {
        email: email.to_string(),
        nickname: nickname.to_string(),
        password: password::hash(&credential)?,
        score: state.config().user_initial_score(),
        permission: Permission::Normal,
        verified: true,
        ip: address.to_string(),
    };

    match state.users().create_user(new_user).await? {
        CreateOutcome::Created(user) => Ok(user),
        CreateOutcome::Conflict => {
            // Lost a race with a concurrent callback for the same profile.
            state
                .users()
                .find_by_email(email)
                .await?
                .ok_or_else(|| AuthError::Internal(anyhow!("account vanished after conflict")))
        }
    }
}

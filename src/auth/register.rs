//! Registration workflow.

use serde_json::json;

use crate::account::{CreateOutcome, NewUser, Permission, Player, User};
use crate::auth::error::AuthError;
use crate::auth::events::{
    EventValue, REGISTRATION_ATTEMPT, REGISTRATION_COMPLETED, REGISTRATION_READY,
};
use crate::auth::identity::{normalize_email, valid_email};
use crate::auth::login::auto_login;
use crate::auth::password;
use crate::auth::state::AuthState;

#[derive(Clone, Debug)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    /// Required when the site registers plain accounts.
    pub nickname: Option<String>,
    /// Required when the site bundles a player with each account.
    pub player_name: Option<String>,
    pub captcha: String,
}

#[derive(Debug)]
pub struct RegistrationSuccess {
    pub user: User,
    pub player: Option<Player>,
    pub session_token: String,
}

/// Run a registration to completion and chain straight into the login
/// success tail; the fresh credential is not re-checked.
///
/// # Errors
/// See [`AuthError`]; store failures propagate as `Internal`.
pub async fn handle_register(
    state: &AuthState,
    form: &RegistrationForm,
    address: &str,
    session_key: &str,
) -> Result<RegistrationSuccess, AuthError> {
    // Raw submitted data, before any validation short-circuits.
    state.events().emit(
        REGISTRATION_ATTEMPT,
        &[EventValue::Data(json!({
            "email": form.email,
            "password": form.password,
            "nickname": form.nickname,
            "player_name": form.player_name,
        }))],
    );

    let email = normalize_email(&form.email);
    if email.is_empty() {
        return Err(AuthError::validation(
            "email",
            "The email field is required.",
        ));
    }
    if !valid_email(&email) {
        return Err(AuthError::validation("email", "Invalid email address."));
    }

    let (min, max) = state.config().password_length();
    if form.password.len() < min || form.password.len() > max {
        return Err(AuthError::validation(
            "password",
            format!("The password must be between {min} and {max} characters."),
        ));
    }

    let with_player = state.config().register_with_player_name();
    let player_name = if with_player {
        let name = form
            .player_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        if name.is_empty() {
            return Err(AuthError::validation(
                "player_name",
                "The player name field is required.",
            ));
        }
        let (min, max) = state.config().player_name_length();
        if name.chars().count() < min || name.chars().count() > max {
            return Err(AuthError::validation(
                "player_name",
                format!("The player name must be between {min} and {max} characters."),
            ));
        }
        if !state.config().player_name_rule().matches(name) {
            return Err(AuthError::validation(
                "player_name",
                "The player name contains characters the site does not allow.",
            ));
        }
        Some(name.to_string())
    } else {
        let nickname = form.nickname.as_deref().map(str::trim).unwrap_or_default();
        if nickname.is_empty() {
            return Err(AuthError::validation(
                "nickname",
                "The nickname field is required.",
            ));
        }
        if nickname.chars().count() > state.config().nickname_max_length() {
            return Err(AuthError::validation("nickname", "The nickname is too long."));
        }
        None
    };

    if form.captcha.trim().is_empty() {
        return Err(AuthError::validation(
            "captcha",
            "The captcha field is required.",
        ));
    }
    if !state.challenges().verify(session_key, &form.captcha) {
        return Err(AuthError::validation(
            "captcha",
            "Captcha verification failed.",
        ));
    }

    if !state.config().user_can_register() {
        return Err(AuthError::Closed(
            "Registration is closed on this site.".to_string(),
        ));
    }

    // Quota is counted from existing rows before any write; -1 is unlimited.
    let quota = state.config().regs_per_ip();
    if quota >= 0 && state.users().registrations_from(address).await? >= quota {
        return Err(AuthError::RateLimited(format!(
            "Each address may register at most {quota} account(s)."
        )));
    }

    if state.users().find_by_email(&email).await?.is_some() {
        return Err(AuthError::Conflict(
            "This email address is already registered.".to_string(),
        ));
    }
    if let Some(name) = player_name.as_deref() {
        if state.users().find_player(name).await?.is_some() {
            return Err(AuthError::Conflict(
                "This player name is already taken.".to_string(),
            ));
        }
    }

    // Post-validation, pre-write.
    state.events().emit(
        REGISTRATION_READY,
        &[EventValue::Data(json!({
            "email": form.email,
            "password": form.password,
            "nickname": form.nickname,
            "player_name": form.player_name,
        }))],
    );

    let nickname = player_name
        .clone()
        .or_else(|| form.nickname.as_deref().map(str::trim).map(str::to_string))
        .unwrap_or_default();
    let new_user = NewUser {
        email: email.clone(),
        nickname,
        password: password::hash(&form.password)?,
        score: state.config().user_initial_score(),
        permission: Permission::Normal,
        verified: false,
        ip: address.to_string(),
    };
    let user = match state.users().create_user(new_user).await? {
        CreateOutcome::Created(user) => user,
        CreateOutcome::Conflict => {
            return Err(AuthError::Conflict(
                "This email address is already registered.".to_string(),
            ))
        }
    };

    let player = match player_name {
        Some(name) => match state.users().create_player(user.uid, &name).await? {
            CreateOutcome::Created(player) => Some(player),
            CreateOutcome::Conflict => {
                return Err(AuthError::Conflict(
                    "This player name is already taken.".to_string(),
                ))
            }
        },
        None => None,
    };

    // Subscribers see the finalized identifier, so this comes after the write.
    state
        .events()
        .emit(REGISTRATION_COMPLETED, &[EventValue::User(user.clone())]);

    let session_token = auto_login(state, &user)?;
    Ok(RegistrationSuccess {
        user,
        player,
        session_token,
    })
}

//! Session login and logout workflows.

use crate::account::User;
use crate::auth::error::AuthError;
use crate::auth::events::{
    EventValue, LOGIN_ATTEMPT, LOGIN_FAILED, LOGIN_READY, LOGIN_SUCCEEDED, LOGOUT_AFTER,
    LOGOUT_BEFORE,
};
use crate::auth::identity::{normalize_email, resolve, valid_email, Channel};
use crate::auth::password;
use crate::auth::state::AuthState;

#[derive(Clone, Debug)]
pub struct LoginForm {
    pub identification: String,
    pub password: String,
    pub captcha: Option<String>,
}

#[derive(Debug)]
pub struct LoginSuccess {
    pub user: User,
    /// Raw session cookie token; only ever handed to the response layer.
    pub session_token: String,
}

/// Run a login attempt to completion.
///
/// Unknown identifiers are rejected without touching the failure counter:
/// the throttle budget only tracks credential mismatches against real
/// accounts. Once the counter reaches the configured threshold, a valid
/// challenge answer is demanded before the credential is even checked.
///
/// # Errors
/// See [`AuthError`]; store failures propagate as `Internal`.
pub async fn handle_login(
    state: &AuthState,
    form: &LoginForm,
    address: &str,
    session_key: &str,
) -> Result<LoginSuccess, AuthError> {
    let identification = form.identification.trim();
    if identification.is_empty() {
        return Err(AuthError::validation(
            "identification",
            "The identification field is required.",
        ));
    }
    let (min, max) = state.config().login_password_length();
    if form.password.len() < min || form.password.len() > max {
        return Err(AuthError::validation(
            "password",
            format!("The password must be between {min} and {max} characters."),
        ));
    }

    // Advisory only; the channel here reflects the identifier's shape, the
    // definitive channel comes out of resolution.
    let channel_hint = if valid_email(&normalize_email(identification)) {
        Channel::Email
    } else {
        Channel::PlayerName
    };
    state.events().emit(
        LOGIN_ATTEMPT,
        &[
            EventValue::Str(identification.to_string()),
            EventValue::Str(form.password.clone()),
            EventValue::Str(channel_hint.as_str().to_string()),
        ],
    );

    let Some((user, _channel)) = resolve(state.users(), identification).await? else {
        return Err(AuthError::UnknownUser);
    };

    state
        .events()
        .emit(LOGIN_READY, &[EventValue::User(user.clone())]);

    if state.throttle().current_count(address) >= state.config().captcha_threshold() {
        let answer = form.captcha.as_deref().unwrap_or_default();
        if !state.challenges().verify(session_key, answer) {
            return Err(AuthError::validation(
                "captcha",
                "Captcha verification failed.",
            ));
        }
    }

    if !password::verify(&form.password, &user.password) {
        let fails = state.throttle().record_failure(address);
        state.events().emit(
            LOGIN_FAILED,
            &[EventValue::User(user.clone()), EventValue::Int(fails as i64)],
        );
        return Err(AuthError::WrongPassword { fails });
    }

    state.throttle().clear(address);
    let session_token = establish(state, &user)?;
    Ok(LoginSuccess {
        user,
        session_token,
    })
}

/// Establish the authenticated session and announce it.
fn establish(state: &AuthState, user: &User) -> Result<String, AuthError> {
    let token = state.sessions().establish(user.uid)?;
    state
        .events()
        .emit(LOGIN_SUCCEEDED, &[EventValue::User(user.clone())]);
    Ok(token)
}

/// Success tail shared by registration auto-login and external logins:
/// `login.ready`, session establishment, `login.succeeded`. No credential
/// re-check happens here.
pub(crate) fn auto_login(state: &AuthState, user: &User) -> Result<String, AuthError> {
    state
        .events()
        .emit(LOGIN_READY, &[EventValue::User(user.clone())]);
    establish(state, user)
}

/// Tear down the session around the logout events.
pub fn handle_logout(state: &AuthState, user: &User, session_token: &str) {
    state
        .events()
        .emit(LOGOUT_BEFORE, &[EventValue::User(user.clone())]);
    state.sessions().revoke(session_token);
    state
        .events()
        .emit(LOGOUT_AFTER, &[EventValue::User(user.clone())]);
}

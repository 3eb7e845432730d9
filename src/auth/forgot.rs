//! Password recovery and email verification workflows.

use uuid::Uuid;

use crate::account::User;
use crate::auth::error::AuthError;
use crate::auth::events::{
    EventValue, FORGOT_ATTEMPT, FORGOT_FAILED, FORGOT_READY, FORGOT_SENT, RESET_AFTER,
    RESET_BEFORE,
};
use crate::auth::identity::normalize_email;
use crate::auth::password;
use crate::auth::signed::{self, TokenClaims, ACTION_RESET, ACTION_VERIFY, TOKEN_VERSION};
use crate::auth::state::AuthState;
use crate::mail::Message;
use secrecy::ExposeSecret;

#[derive(Clone, Debug)]
pub struct ForgotForm {
    pub email: String,
    pub captcha: String,
}

fn sign_reference(
    state: &AuthState,
    uid: i64,
    action: &str,
    ttl_seconds: i64,
) -> Result<String, AuthError> {
    let now = state.now();
    let claims = TokenClaims {
        v: TOKEN_VERSION,
        sub: uid,
        act: action.to_string(),
        iat: now,
        exp: now + ttl_seconds,
        jti: Uuid::new_v4().to_string(),
    };
    signed::sign_hs256(state.config().secret().expose_secret().as_bytes(), &claims)
        .map_err(|err| AuthError::Internal(anyhow::anyhow!("failed to sign reference: {err}")))
}

/// Build the recovery link a user completes the reset with.
fn reset_url(state: &AuthState, uid: i64, reference: &str) -> String {
    format!("{}/auth/reset/{uid}?token={reference}", state.config().base_url())
}

/// Signed verification link for the notification layer to dispatch.
///
/// # Errors
/// Returns an error if signing fails.
pub fn issue_verification_url(state: &AuthState, user: &User) -> Result<String, AuthError> {
    let reference = sign_reference(
        state,
        user.uid,
        ACTION_VERIFY,
        state.config().reset_ttl_seconds(),
    )?;
    Ok(format!(
        "{}/auth/verify/{}?token={reference}",
        state.config().base_url(),
        user.uid
    ))
}

/// Phase 1: dispatch a recovery email carrying a signed, expiring reference.
///
/// The cooldown slot is reserved atomically before the send and given back on
/// transport failure, so concurrent requests inside the window yield exactly
/// one email. Delivery failures surface the transport message and are not
/// retried.
///
/// # Errors
/// See [`AuthError`]; store failures propagate as `Internal`.
pub async fn handle_forgot(
    state: &AuthState,
    form: &ForgotForm,
    address: &str,
    session_key: &str,
) -> Result<(), AuthError> {
    if !state.config().mail_enabled() {
        return Err(AuthError::Closed(
            "Password recovery is not available on this site.".to_string(),
        ));
    }

    if !state.challenges().verify(session_key, &form.captcha) {
        return Err(AuthError::validation(
            "captcha",
            "Captcha verification failed.",
        ));
    }

    state
        .events()
        .emit(FORGOT_ATTEMPT, &[EventValue::Str(form.email.clone())]);

    if !state.mail_gate().try_reserve(address) {
        return Err(AuthError::RateLimited(
            "A recovery email was sent recently; please wait before retrying.".to_string(),
        ));
    }

    let email = normalize_email(&form.email);
    let user = match state.users().find_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            // Nothing was sent; do not burn the slot on a typo.
            state.mail_gate().release(address);
            return Err(AuthError::UnknownUser);
        }
        Err(err) => {
            state.mail_gate().release(address);
            return Err(AuthError::Internal(err));
        }
    };

    state
        .events()
        .emit(FORGOT_READY, &[EventValue::User(user.clone())]);

    let reference = sign_reference(state, user.uid, ACTION_RESET, state.config().reset_ttl_seconds())?;
    let url = reset_url(state, user.uid, &reference);

    let message = Message {
        to: user.email.clone(),
        subject: format!("Reset your password on {}", state.config().site_name()),
        body: format!(
            "Open this link to set a new password (valid for a limited time):\n{url}\n\n\
             If you did not request this, ignore this message."
        ),
    };

    match state.mailer().send(&message).await {
        Ok(()) => {
            state.events().emit(
                FORGOT_SENT,
                &[EventValue::User(user.clone()), EventValue::Str(url)],
            );
            Ok(())
        }
        Err(err) => {
            state.mail_gate().release(address);
            state.events().emit(
                FORGOT_FAILED,
                &[EventValue::User(user.clone()), EventValue::Str(url)],
            );
            Err(AuthError::Transport(err.to_string()))
        }
    }
}

/// Phase 2: complete a reset presented with a signed reference.
///
/// # Errors
/// `Capability` when the reference is invalid, expired, or bound to a
/// different account; `Validation` for credential bounds.
pub async fn handle_reset(
    state: &AuthState,
    uid: i64,
    reference: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    let claims = signed::verify_hs256(
        reference,
        state.config().secret().expose_secret().as_bytes(),
        ACTION_RESET,
        state.now(),
    )
    .map_err(|_| AuthError::Capability)?;
    if claims.sub != uid {
        return Err(AuthError::Capability);
    }

    let user = state
        .users()
        .find_by_uid(uid)
        .await?
        .ok_or(AuthError::Capability)?;

    let (min, max) = state.config().password_length();
    if new_password.len() < min || new_password.len() > max {
        return Err(AuthError::validation(
            "password",
            format!("The password must be between {min} and {max} characters."),
        ));
    }

    state.events().emit(
        RESET_BEFORE,
        &[
            EventValue::User(user.clone()),
            EventValue::Str(new_password.to_string()),
        ],
    );

    let hash = password::hash(new_password)?;
    state.users().update_password(uid, &hash).await?;

    state.events().emit(
        RESET_AFTER,
        &[
            EventValue::User(user.clone()),
            EventValue::Str(new_password.to_string()),
        ],
    );
    Ok(())
}

/// Complete email verification from a signed reference.
///
/// # Errors
/// `Closed` when verification is disabled; `Capability` for invalid, expired,
/// or already-used references.
pub async fn handle_verify(state: &AuthState, uid: i64, reference: &str) -> Result<User, AuthError> {
    if !state.config().require_verification() {
        return Err(AuthError::Closed(
            "Account verification is disabled on this site.".to_string(),
        ));
    }

    let claims = signed::verify_hs256(
        reference,
        state.config().secret().expose_secret().as_bytes(),
        ACTION_VERIFY,
        state.now(),
    )
    .map_err(|_| AuthError::Capability)?;
    if claims.sub != uid {
        return Err(AuthError::Capability);
    }

    let user = state
        .users()
        .find_by_uid(uid)
        .await?
        .ok_or(AuthError::Capability)?;
    if user.verified {
        return Err(AuthError::Capability);
    }

    state.users().set_verified(uid, true).await?;
    Ok(User {
        verified: true,
        ..user
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::config::MemoryOptions;
    use crate::auth::test_support::{
        recorder, seed_user, test_state_with, FailingMailer, RecordingMailer,
    };
    use std::sync::Arc;

    fn mail_enabled_options() -> Arc<MemoryOptions> {
        let options = Arc::new(MemoryOptions::new());
        options.set("mail_enabled", "true");
        options
    }

    fn forgot_form(email: &str, captcha: &str) -> ForgotForm {
        ForgotForm {
            email: email.to_string(),
            captcha: captcha.to_string(),
        }
    }

    #[tokio::test]
    async fn forgot_sends_a_signed_link() -> anyhow::Result<()> {
        let mailer = Arc::new(RecordingMailer::new());
        let state = test_state_with(mail_enabled_options(), mailer.clone());
        let user = seed_user(&state, "a@b.c", "12345678").await;
        let attempt = recorder(state.events(), FORGOT_ATTEMPT);
        let ready = recorder(state.events(), FORGOT_READY);
        let sent = recorder(state.events(), FORGOT_SENT);

        let captcha = state.challenges().issue("sess");
        handle_forgot(&state, &forgot_form("a@b.c", &captcha), "1.2.3.4", "sess")
            .await
            .map_err(|err| anyhow::anyhow!("forgot failed: {err}"))?;

        let messages = mailer.sent();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].to, "a@b.c");
        assert!(messages[0].body.contains(&format!("/auth/reset/{}", user.uid)));

        assert_eq!(attempt.count(), 1);
        assert_eq!(ready.count(), 1);
        assert_eq!(sent.count(), 1);
        let payload = sent.last().expect("payload recorded");
        assert_eq!(payload[0].as_user().map(|u| u.uid), Some(user.uid));
        assert!(payload[1]
            .as_str()
            .is_some_and(|url| url.contains(&format!("/auth/reset/{}", user.uid))));
        Ok(())
    }

    #[tokio::test]
    async fn forgot_is_closed_without_a_mail_transport() {
        let state = test_state_with(Arc::new(MemoryOptions::new()), Arc::new(RecordingMailer::new()));
        let captcha = state.challenges().issue("sess");
        let result = handle_forgot(&state, &forgot_form("a@b.c", &captcha), "1.2.3.4", "sess").await;
        assert!(matches!(result, Err(AuthError::Closed(_))));
    }

    #[tokio::test]
    async fn cooldown_allows_exactly_one_email() -> anyhow::Result<()> {
        let mailer = Arc::new(RecordingMailer::new());
        let state = test_state_with(mail_enabled_options(), mailer.clone());
        seed_user(&state, "a@b.c", "12345678").await;

        let captcha = state.challenges().issue("sess");
        handle_forgot(&state, &forgot_form("a@b.c", &captcha), "1.2.3.4", "sess")
            .await
            .map_err(|err| anyhow::anyhow!("forgot failed: {err}"))?;

        let sent_events = recorder(state.events(), FORGOT_SENT);
        let captcha = state.challenges().issue("sess");
        let result =
            handle_forgot(&state, &forgot_form("a@b.c", &captcha), "1.2.3.4", "sess").await;
        assert!(matches!(result, Err(AuthError::RateLimited(_))));
        assert_eq!(mailer.sent().len(), 1);
        assert_eq!(sent_events.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_email_is_distinct_and_frees_the_slot() -> anyhow::Result<()> {
        let mailer = Arc::new(RecordingMailer::new());
        let state = test_state_with(mail_enabled_options(), mailer.clone());
        seed_user(&state, "a@b.c", "12345678").await;

        let captcha = state.challenges().issue("sess");
        let result =
            handle_forgot(&state, &forgot_form("nope@nope.net", &captcha), "1.2.3.4", "sess").await;
        assert!(matches!(result, Err(AuthError::UnknownUser)));
        assert!(mailer.sent().is_empty());

        // The slot was not burned by the unknown address.
        let captcha = state.challenges().issue("sess");
        handle_forgot(&state, &forgot_form("a@b.c", &captcha), "1.2.3.4", "sess")
            .await
            .map_err(|err| anyhow::anyhow!("forgot failed: {err}"))?;
        assert_eq!(mailer.sent().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_surfaces_and_emits_failed() {
        let state = test_state_with(mail_enabled_options(), Arc::new(FailingMailer("A fake exception.")));
        seed_user(&state, "a@b.c", "12345678").await;
        let sent = recorder(state.events(), FORGOT_SENT);
        let failed = recorder(state.events(), FORGOT_FAILED);

        let captcha = state.challenges().issue("sess");
        let result = handle_forgot(&state, &forgot_form("a@b.c", &captcha), "1.2.3.4", "sess").await;
        match result {
            Err(AuthError::Transport(message)) => {
                assert!(message.contains("A fake exception."));
            }
            other => panic!("expected Transport, got {other:?}"),
        }
        assert_eq!(sent.count(), 0);
        assert_eq!(failed.count(), 1);

        // The slot reopened, so a later attempt can retry.
        let captcha = state.challenges().issue("sess");
        let result = handle_forgot(&state, &forgot_form("a@b.c", &captcha), "1.2.3.4", "sess").await;
        assert!(matches!(result, Err(AuthError::Transport(_))));
    }

    #[tokio::test]
    async fn reset_round_trip_changes_the_credential() -> anyhow::Result<()> {
        let state = test_state_with(mail_enabled_options(), Arc::new(RecordingMailer::new()));
        let user = seed_user(&state, "a@b.c", "12345678").await;
        let before = recorder(state.events(), RESET_BEFORE);
        let after = recorder(state.events(), RESET_AFTER);

        let reference = sign_reference(&state, user.uid, ACTION_RESET, 3600)
            .map_err(|err| anyhow::anyhow!("sign failed: {err}"))?;
        handle_reset(&state, user.uid, &reference, "new-password")
            .await
            .map_err(|err| anyhow::anyhow!("reset failed: {err}"))?;

        let updated = state
            .users()
            .find_by_uid(user.uid)
            .await?
            .expect("user exists");
        assert!(password::verify("new-password", &updated.password));
        assert!(!password::verify("12345678", &updated.password));
        assert_eq!(before.count(), 1);
        assert_eq!(after.count(), 1);
        let payload = after.last().expect("payload recorded");
        assert_eq!(payload[1].as_str(), Some("new-password"));
        Ok(())
    }

    #[tokio::test]
    async fn reset_validates_credential_bounds() -> anyhow::Result<()> {
        let state = test_state_with(mail_enabled_options(), Arc::new(RecordingMailer::new()));
        let user = seed_user(&state, "a@b.c", "12345678").await;
        let reference = sign_reference(&state, user.uid, ACTION_RESET, 3600)
            .map_err(|err| anyhow::anyhow!("sign failed: {err}"))?;

        let result = handle_reset(&state, user.uid, &reference, "123").await;
        assert!(matches!(
            result,
            Err(AuthError::Validation {
                field: "password",
                ..
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn reset_rejects_forged_expired_or_mismatched_references() -> anyhow::Result<()> {
        let state = test_state_with(mail_enabled_options(), Arc::new(RecordingMailer::new()));
        let user = seed_user(&state, "a@b.c", "12345678").await;

        // Expired.
        let reference = sign_reference(&state, user.uid, ACTION_RESET, -1)
            .map_err(|err| anyhow::anyhow!("sign failed: {err}"))?;
        let result = handle_reset(&state, user.uid, &reference, "new-password").await;
        assert!(matches!(result, Err(AuthError::Capability)));

        // Bound to a different account.
        let reference = sign_reference(&state, user.uid + 1, ACTION_RESET, 3600)
            .map_err(|err| anyhow::anyhow!("sign failed: {err}"))?;
        let result = handle_reset(&state, user.uid, &reference, "new-password").await;
        assert!(matches!(result, Err(AuthError::Capability)));

        // Wrong action: a verification link cannot reset a password.
        let reference = sign_reference(&state, user.uid, ACTION_VERIFY, 3600)
            .map_err(|err| anyhow::anyhow!("sign failed: {err}"))?;
        let result = handle_reset(&state, user.uid, &reference, "new-password").await;
        assert!(matches!(result, Err(AuthError::Capability)));

        // Tampered.
        let reference = sign_reference(&state, user.uid, ACTION_RESET, 3600)
            .map_err(|err| anyhow::anyhow!("sign failed: {err}"))?;
        let tampered = format!("{}A", &reference[..reference.len() - 1]);
        if tampered != reference {
            let result = handle_reset(&state, user.uid, &tampered, "new-password").await;
            assert!(matches!(result, Err(AuthError::Capability)));
        }
        Ok(())
    }

    #[tokio::test]
    async fn verify_sets_the_flag_once() -> anyhow::Result<()> {
        let options = mail_enabled_options();
        options.set("require_verification", "true");
        let state = test_state_with(options, Arc::new(RecordingMailer::new()));
        let user = seed_user(&state, "a@b.c", "12345678").await;

        let url = issue_verification_url(&state, &user)
            .map_err(|err| anyhow::anyhow!("issue failed: {err}"))?;
        let reference = url
            .split("token=")
            .nth(1)
            .expect("url carries the reference")
            .to_string();

        let verified = handle_verify(&state, user.uid, &reference)
            .await
            .map_err(|err| anyhow::anyhow!("verify failed: {err}"))?;
        assert!(verified.verified);
        let stored = state
            .users()
            .find_by_uid(user.uid)
            .await?
            .expect("user exists");
        assert!(stored.verified);

        // Second presentation: already verified, uniformly rejected.
        let result = handle_verify(&state, user.uid, &reference).await;
        assert!(matches!(result, Err(AuthError::Capability)));
        Ok(())
    }

    #[tokio::test]
    async fn verify_requires_the_feature_flag() -> anyhow::Result<()> {
        let state = test_state_with(mail_enabled_options(), Arc::new(RecordingMailer::new()));
        let user = seed_user(&state, "a@b.c", "12345678").await;
        let url = issue_verification_url(&state, &user)
            .map_err(|err| anyhow::anyhow!("issue failed: {err}"))?;
        let reference = url.split("token=").nth(1).expect("reference").to_string();

        let result = handle_verify(&state, user.uid, &reference).await;
        assert!(matches!(result, Err(AuthError::Closed(_))));
        Ok(())
    }
}

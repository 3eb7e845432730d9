//! Request/response types for the auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Uniform response envelope; `code == 0` means success.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Envelope {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    /// Email address or player name.
    pub identification: String,
    pub password: String,
    pub captcha: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub nickname: Option<String>,
    pub player_name: Option<String>,
    pub captcha: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotRequest {
    pub email: String,
    pub captcha: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetRequest {
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignedQuery {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ApiLoginRequest {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_omits_absent_data() -> anyhow::Result<()> {
        let value = serde_json::to_value(Envelope::new(0, "ok"))?;
        assert_eq!(value, serde_json::json!({"code": 0, "message": "ok"}));
        Ok(())
    }

    #[test]
    fn envelope_serializes_data() -> anyhow::Result<()> {
        let value = serde_json::to_value(Envelope::with_data(
            1,
            "wrong",
            serde_json::json!({"login_fails": 5}),
        ))?;
        assert_eq!(value["data"]["login_fails"], 5);
        Ok(())
    }

    #[test]
    fn login_request_round_trips() -> anyhow::Result<()> {
        let request: LoginRequest = serde_json::from_value(serde_json::json!({
            "identification": "a@b.c",
            "password": "12345678",
        }))?;
        assert_eq!(request.identification, "a@b.c");
        assert!(request.captcha.is_none());
        Ok(())
    }
}

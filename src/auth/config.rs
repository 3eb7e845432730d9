//! Site options and auth configuration.
//!
//! The admin surfaces own a full options-form framework; the core only
//! depends on this narrow key-to-value reader and falls back to built-in
//! defaults for anything unset.

use regex::Regex;
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

const DEFAULT_SESSION_TTL_SECONDS: u64 = 12 * 60 * 60;
const DEFAULT_RESET_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_API_TOKEN_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_THROTTLE_TTL_SECONDS: u64 = 24 * 60 * 60;
const DEFAULT_MAIL_COOLDOWN_SECONDS: u64 = 60;
const DEFAULT_CAPTCHA_TTL_SECONDS: u64 = 5 * 60;
const DEFAULT_CAPTCHA_THRESHOLD: u64 = 5;
const DEFAULT_INITIAL_SCORE: i64 = 1000;

/// Read-only access to the current site options.
pub trait Options: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Options held in memory; the admin layer (out of scope here) swaps values
/// at runtime, so reads go through a lock rather than a snapshot.
#[derive(Default)]
pub struct MemoryOptions {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut values = self.values.write().expect("options poisoned");
        values.insert(key.to_string(), value.to_string());
    }
}

impl Options for MemoryOptions {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().expect("options poisoned");
        values.get(key).cloned()
    }
}

/// Shape rule applied to new player names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerNameRule {
    /// Letters, digits and underscores, as the official launcher accepts.
    Official,
    /// Official charset plus CJK ideographs.
    Cjk,
    /// Site-provided regular expression.
    Custom(String),
}

impl PlayerNameRule {
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let pattern = match self {
            Self::Official => r"^[A-Za-z0-9_]+$",
            Self::Cjk => r"^[A-Za-z0-9_\p{Han}]+$",
            Self::Custom(pattern) => pattern.as_str(),
        };
        Regex::new(pattern).is_ok_and(|regex| regex.is_match(name))
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    options: Arc<dyn Options>,
    base_url: String,
    secret: SecretString,
    session_ttl_seconds: u64,
    reset_ttl_seconds: i64,
    api_token_ttl_seconds: i64,
    throttle_ttl_seconds: u64,
    mail_cooldown_seconds: u64,
    captcha_ttl_seconds: u64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(options: Arc<dyn Options>, base_url: String, secret: SecretString) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            options,
            base_url,
            secret,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            reset_ttl_seconds: DEFAULT_RESET_TTL_SECONDS,
            api_token_ttl_seconds: DEFAULT_API_TOKEN_TTL_SECONDS,
            throttle_ttl_seconds: DEFAULT_THROTTLE_TTL_SECONDS,
            mail_cooldown_seconds: DEFAULT_MAIL_COOLDOWN_SECONDS,
            captcha_ttl_seconds: DEFAULT_CAPTCHA_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_reset_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_api_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.api_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_throttle_ttl_seconds(mut self, seconds: u64) -> Self {
        self.throttle_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_mail_cooldown_seconds(mut self, seconds: u64) -> Self {
        self.mail_cooldown_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_captcha_ttl_seconds(mut self, seconds: u64) -> Self {
        self.captcha_ttl_seconds = seconds;
        self
    }

    fn bool_option(&self, key: &str, default: bool) -> bool {
        self.options
            .get(key)
            .map_or(default, |value| matches!(value.as_str(), "1" | "true"))
    }

    fn int_option(&self, key: &str, default: i64) -> i64 {
        self.options
            .get(key)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }

    #[must_use]
    pub fn site_name(&self) -> String {
        self.options
            .get("site_name")
            .unwrap_or_else(|| "Vesti".to_string())
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    #[must_use]
    pub fn user_can_register(&self) -> bool {
        self.bool_option("user_can_register", true)
    }

    #[must_use]
    pub fn require_verification(&self) -> bool {
        self.bool_option("require_verification", false)
    }

    /// Per-address registration quota; `-1` means unlimited.
    #[must_use]
    pub fn regs_per_ip(&self) -> i64 {
        self.int_option("regs_per_ip", -1)
    }

    #[must_use]
    pub fn register_with_player_name(&self) -> bool {
        self.bool_option("register_with_player_name", false)
    }

    #[must_use]
    pub fn player_name_rule(&self) -> PlayerNameRule {
        match self.options.get("player_name_rule").as_deref() {
            Some("cjk") => PlayerNameRule::Cjk,
            Some("custom") => {
                let pattern = self
                    .options
                    .get("custom_player_name_regex")
                    .unwrap_or_default();
                PlayerNameRule::Custom(pattern)
            }
            _ => PlayerNameRule::Official,
        }
    }

    #[must_use]
    pub fn player_name_length(&self) -> (usize, usize) {
        let min = self.int_option("player_name_length_min", 3).max(1) as usize;
        let max = self.int_option("player_name_length_max", 16).max(1) as usize;
        (min, max)
    }

    /// Bounds applied when setting a credential (registration, reset).
    #[must_use]
    pub fn password_length(&self) -> (usize, usize) {
        let min = self.int_option("password_length_min", 8).max(1) as usize;
        let max = self.int_option("password_length_max", 32).max(1) as usize;
        (min, max)
    }

    /// Bounds applied when presenting a credential at login.
    #[must_use]
    pub fn login_password_length(&self) -> (usize, usize) {
        let min = self.int_option("login_password_length_min", 6).max(1) as usize;
        let max = self.int_option("login_password_length_max", 32).max(1) as usize;
        (min, max)
    }

    #[must_use]
    pub fn nickname_max_length(&self) -> usize {
        self.int_option("nickname_length_max", 255).max(1) as usize
    }

    #[must_use]
    pub fn user_initial_score(&self) -> i64 {
        self.int_option("user_initial_score", DEFAULT_INITIAL_SCORE)
    }

    /// Failed-login count at which a captcha becomes mandatory.
    #[must_use]
    pub fn captcha_threshold(&self) -> u64 {
        let threshold = self.int_option("captcha_threshold", 0);
        if threshold > 0 {
            threshold as u64
        } else {
            DEFAULT_CAPTCHA_THRESHOLD
        }
    }

    /// Password recovery is available only when a mail transport is configured.
    #[must_use]
    pub fn mail_enabled(&self) -> bool {
        self.bool_option("mail_enabled", false)
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn reset_ttl_seconds(&self) -> i64 {
        self.reset_ttl_seconds
    }

    #[must_use]
    pub fn api_token_ttl_seconds(&self) -> i64 {
        self.api_token_ttl_seconds
    }

    #[must_use]
    pub fn throttle_ttl_seconds(&self) -> u64 {
        self.throttle_ttl_seconds
    }

    #[must_use]
    pub fn mail_cooldown_seconds(&self) -> u64 {
        self.mail_cooldown_seconds
    }

    #[must_use]
    pub fn captcha_ttl_seconds(&self) -> u64 {
        self.captcha_ttl_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(options: Arc<MemoryOptions>) -> AuthConfig {
        AuthConfig::new(
            options,
            "https://skins.example.test/".to_string(),
            SecretString::from("secret"),
        )
    }

    #[test]
    fn defaults_apply_when_options_are_unset() {
        let config = config_with(Arc::new(MemoryOptions::new()));
        assert!(config.user_can_register());
        assert!(!config.require_verification());
        assert!(!config.register_with_player_name());
        assert!(!config.mail_enabled());
        assert_eq!(config.regs_per_ip(), -1);
        assert_eq!(config.captcha_threshold(), DEFAULT_CAPTCHA_THRESHOLD);
        assert_eq!(config.site_name(), "Vesti");
        assert_eq!(config.base_url(), "https://skins.example.test");
    }

    #[test]
    fn options_override_defaults_live() {
        let options = Arc::new(MemoryOptions::new());
        let config = config_with(options.clone());

        assert!(config.user_can_register());
        options.set("user_can_register", "false");
        assert!(!config.user_can_register());

        options.set("regs_per_ip", "3");
        assert_eq!(config.regs_per_ip(), 3);

        options.set("site_name", "My Skins");
        assert_eq!(config.site_name(), "My Skins");
    }

    #[test]
    fn builder_overrides_ttls() {
        let config = config_with(Arc::new(MemoryOptions::new()))
            .with_session_ttl_seconds(60)
            .with_reset_ttl_seconds(120)
            .with_api_token_ttl_seconds(180)
            .with_throttle_ttl_seconds(240)
            .with_mail_cooldown_seconds(300)
            .with_captcha_ttl_seconds(360);
        assert_eq!(config.session_ttl_seconds(), 60);
        assert_eq!(config.reset_ttl_seconds(), 120);
        assert_eq!(config.api_token_ttl_seconds(), 180);
        assert_eq!(config.throttle_ttl_seconds(), 240);
        assert_eq!(config.mail_cooldown_seconds(), 300);
        assert_eq!(config.captcha_ttl_seconds(), 360);
    }

    #[test]
    fn credential_bounds_default_and_override() {
        let options = Arc::new(MemoryOptions::new());
        let config = config_with(options.clone());
        assert_eq!(config.password_length(), (8, 32));
        assert_eq!(config.login_password_length(), (6, 32));
        assert_eq!(config.nickname_max_length(), 255);

        options.set("password_length_min", "10");
        assert_eq!(config.password_length(), (10, 32));
    }

    #[test]
    fn official_rule_rejects_ideographs() {
        assert!(PlayerNameRule::Official.matches("Steve_01"));
        assert!(!PlayerNameRule::Official.matches("角色名"));
        assert!(!PlayerNameRule::Official.matches("has space"));
    }

    #[test]
    fn cjk_rule_accepts_ideographs() {
        assert!(PlayerNameRule::Cjk.matches("角色名"));
        assert!(PlayerNameRule::Cjk.matches("Steve角色"));
        assert!(!PlayerNameRule::Cjk.matches("emoji😀"));
    }

    #[test]
    fn custom_rule_uses_site_regex() {
        let rule = PlayerNameRule::Custom(r"^[a-z]+$".to_string());
        assert!(rule.matches("steve"));
        assert!(!rule.matches("Steve"));

        // An invalid pattern never matches rather than panicking.
        let broken = PlayerNameRule::Custom("[".to_string());
        assert!(!broken.matches("steve"));
    }

    #[test]
    fn player_name_rule_selected_from_options() {
        let options = Arc::new(MemoryOptions::new());
        let config = config_with(options.clone());
        assert_eq!(config.player_name_rule(), PlayerNameRule::Official);

        options.set("player_name_rule", "cjk");
        assert_eq!(config.player_name_rule(), PlayerNameRule::Cjk);

        options.set("player_name_rule", "custom");
        options.set("custom_player_name_regex", "^x+$");
        assert_eq!(
            config.player_name_rule(),
            PlayerNameRule::Custom("^x+$".to_string())
        );
    }
}

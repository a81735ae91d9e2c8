//! Credential resolution.
//!
//! The bot token and the optional webhook secret are resolved through a
//! [`SecretSource`] on every request. Nothing is cached: the default
//! [`EnvSecrets`] source reads the process environment at call time, so a
//! rotated token takes effect on the next request.

use crate::error::HostbotError;
use std::fmt;

/// Default environment variable holding the bot token.
pub const DEFAULT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
/// Default environment variable holding the webhook shared secret.
pub const DEFAULT_SECRET_ENV: &str = "TELEGRAM_WEBHOOK_SECRET";

/// Opaque bot token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Where the bot token and webhook secret come from.
///
/// Implementations must return `None` for unset values; empty strings are
/// normalized to `None` by the callers below.
pub trait SecretSource: Send + Sync {
    /// Raw bot token, if any.
    fn bot_token(&self) -> Option<String>;

    /// Raw webhook shared secret, if any.
    fn webhook_secret(&self) -> Option<String>;

    /// Name shown in the "missing credential" message.
    fn token_name(&self) -> &str {
        DEFAULT_TOKEN_ENV
    }
}

/// Resolve the bot token, failing closed when it is absent or empty.
pub fn credential(source: &dyn SecretSource) -> Result<Credential, HostbotError> {
    match non_empty(source.bot_token()) {
        Some(token) => Ok(Credential(token)),
        None => Err(HostbotError::Config(format!(
            "Missing {} environment variable",
            source.token_name()
        ))),
    }
}

/// Resolve the webhook secret. `None` means inbound calls are unauthenticated.
pub fn webhook_secret(source: &dyn SecretSource) -> Option<String> {
    non_empty(source.webhook_secret())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Reads both values from the process environment on every call.
#[derive(Debug, Clone)]
pub struct EnvSecrets {
    token_var: String,
    secret_var: String,
}

impl EnvSecrets {
    pub fn new(token_var: impl Into<String>, secret_var: impl Into<String>) -> Self {
        Self {
            token_var: token_var.into(),
            secret_var: secret_var.into(),
        }
    }
}

impl Default for EnvSecrets {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_ENV, DEFAULT_SECRET_ENV)
    }
}

impl SecretSource for EnvSecrets {
    fn bot_token(&self) -> Option<String> {
        std::env::var(&self.token_var).ok()
    }

    fn webhook_secret(&self) -> Option<String> {
        std::env::var(&self.secret_var).ok()
    }

    fn token_name(&self) -> &str {
        &self.token_var
    }
}

/// Fixed values (from the config file or a test), with an optional
/// environment fallback for whichever value is unset.
#[derive(Clone, Default)]
pub struct StaticSecrets {
    bot_token: Option<String>,
    webhook_secret: Option<String>,
    fallback: Option<EnvSecrets>,
}

impl StaticSecrets {
    pub fn new(bot_token: Option<String>, webhook_secret: Option<String>) -> Self {
        Self {
            bot_token: non_empty(bot_token),
            webhook_secret: non_empty(webhook_secret),
            fallback: None,
        }
    }

    /// Fall back to the environment for values not set here.
    pub fn or_env(mut self, env: EnvSecrets) -> Self {
        self.fallback = Some(env);
        self
    }
}

impl fmt::Debug for StaticSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSecrets")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "***"))
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "***"))
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl SecretSource for StaticSecrets {
    fn bot_token(&self) -> Option<String> {
        self.bot_token
            .clone()
            .or_else(|| self.fallback.as_ref().and_then(|env| env.bot_token()))
    }

    fn webhook_secret(&self) -> Option<String> {
        self.webhook_secret
            .clone()
            .or_else(|| self.fallback.as_ref().and_then(|env| env.webhook_secret()))
    }

    fn token_name(&self) -> &str {
        self.fallback
            .as_ref()
            .map_or(DEFAULT_TOKEN_ENV, |env| env.token_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_is_config_error() {
        let source = StaticSecrets::new(None, None);
        let err = credential(&source).unwrap_err();
        assert!(matches!(err, HostbotError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Missing TELEGRAM_BOT_TOKEN environment variable"
        );
    }

    #[test]
    fn test_empty_token_is_missing() {
        let source = StaticSecrets::new(Some(String::new()), None);
        assert!(credential(&source).is_err());
    }

    #[test]
    fn test_static_token_resolves() {
        let source = StaticSecrets::new(Some("123:abc".to_string()), None);
        let cred = credential(&source).unwrap();
        assert_eq!(cred.expose(), "123:abc");
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let source = StaticSecrets::new(Some("123:abc".to_string()), Some("s3cret".into()));
        let cred = credential(&source).unwrap();
        assert_eq!(format!("{cred:?}"), "Credential(***)");
        assert!(!format!("{source:?}").contains("s3cret"));
    }

    #[test]
    fn test_empty_webhook_secret_is_none() {
        let source = StaticSecrets::new(None, Some(String::new()));
        assert_eq!(webhook_secret(&source), None);

        let source = StaticSecrets::new(None, Some("s3cret".into()));
        assert_eq!(webhook_secret(&source).as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_env_secrets_read_at_call_time() {
        let token_var = "__HOSTBOT_TEST_TOKEN_CALL_TIME__";
        let secrets = EnvSecrets::new(token_var, "__HOSTBOT_TEST_SECRET_UNSET__");

        std::env::remove_var(token_var);
        let err = credential(&secrets).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Missing {token_var} environment variable")
        );

        std::env::set_var(token_var, "42:xyz");
        assert_eq!(credential(&secrets).unwrap().expose(), "42:xyz");
        assert_eq!(webhook_secret(&secrets), None);

        std::env::remove_var(token_var);
        assert!(credential(&secrets).is_err());
    }

    #[test]
    fn test_static_falls_back_to_env() {
        let secret_var = "__HOSTBOT_TEST_SECRET_FALLBACK__";
        std::env::set_var(secret_var, "from-env");
        let source = StaticSecrets::new(Some("file-token".into()), None)
            .or_env(EnvSecrets::new("__HOSTBOT_TEST_TOKEN_UNUSED__", secret_var));

        assert_eq!(credential(&source).unwrap().expose(), "file-token");
        assert_eq!(webhook_secret(&source).as_deref(), Some("from-env"));
        std::env::remove_var(secret_var);
    }
}

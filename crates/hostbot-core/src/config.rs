use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::HostbotError;
use crate::secrets::{EnvSecrets, SecretSource, StaticSecrets};

/// Top-level hostbot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub commands: CommandReplies,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    /// Directory for daily-rotated log files. Empty = stderr only.
    #[serde(default)]
    pub log_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            log_dir: String::new(),
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Per-request timeout for Bot API calls. 0 = no bound.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Bot token. Empty = read `token_env` on every request.
    #[serde(default)]
    pub bot_token: String,
    /// Webhook shared secret. Empty = read `secret_env` on every request.
    #[serde(default)]
    pub webhook_secret: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            bot_token: String::new(),
            webhook_secret: String::new(),
            token_env: default_token_env(),
            secret_env: default_secret_env(),
        }
    }
}

impl TelegramConfig {
    /// Outbound request timeout, if bounded.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Build the secret source: file values first, then the environment.
    pub fn secrets(&self) -> Arc<dyn SecretSource> {
        let env = EnvSecrets::new(&self.token_env, &self.secret_env);
        if self.bot_token.is_empty() && self.webhook_secret.is_empty() {
            return Arc::new(env);
        }
        Arc::new(
            StaticSecrets::new(
                Some(self.bot_token.clone()),
                Some(self.webhook_secret.clone()),
            )
            .or_env(env),
        )
    }
}

/// Canned replies for the fixed inbound commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandReplies {
    #[serde(default = "default_start_reply")]
    pub start: String,
    #[serde(default = "default_help_reply")]
    pub help: String,
    #[serde(default = "default_host_reply")]
    pub host: String,
}

impl Default for CommandReplies {
    fn default() -> Self {
        Self {
            start: default_start_reply(),
            help: default_help_reply(),
            host: default_host_reply(),
        }
    }
}

// --- Defaults ---

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_body_limit() -> usize {
    1024 * 1024
}
fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_token_env() -> String {
    crate::secrets::DEFAULT_TOKEN_ENV.to_string()
}
fn default_secret_env() -> String {
    crate::secrets::DEFAULT_SECRET_ENV.to_string()
}
fn default_start_reply() -> String {
    "\u{1F916} Hosting bot online! Send /help for available commands.".to_string()
}
fn default_help_reply() -> String {
    "Available commands:\n/start - check bot status\n/help - view help\n/host - instructions to deploy"
        .to_string()
}
fn default_host_reply() -> String {
    "Deploy this bot by setting TELEGRAM_BOT_TOKEN on your host and pointing your webhook to /api/webhook."
        .to_string()
}

/// Read configuration from a TOML file. `Ok(None)` when the file does not
/// exist; the caller decides whether to fall back to defaults.
pub fn read(path: &str) -> Result<Option<Config>, HostbotError> {
    let path = Path::new(path);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| HostbotError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| HostbotError::Config(format!("failed to parse config: {}", e)))?;

    Ok(Some(config))
}

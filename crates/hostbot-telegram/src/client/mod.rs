//! Bot API client: one outbound call per operation, response passed through.


use crate::types::{
    BotInfo, ChatId, DeleteWebhookRequest, ParseMode, SendMessageRequest, SentMessage,
    SetWebhookRequest, TgResponse,
};
use hostbot_core::config::TelegramConfig;
use hostbot_core::error::HostbotError;
use hostbot_core::secrets::{self, Credential, SecretSource};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const API_ERROR: &str = "Telegram API error";
const STATUS_ERROR: &str = "Unable to fetch bot info";

/// Telegram Bot API relay.
///
/// Holds no per-bot state: the token is resolved from the secret source at
/// the top of every operation, before any validation or network I/O.
pub struct BotApi {
    client: reqwest::Client,
    api_base: String,
    secrets: Arc<dyn SecretSource>,
}

impl BotApi {
    pub fn new(
        api_base: impl Into<String>,
        secrets: Arc<dyn SecretSource>,
        timeout: Option<Duration>,
    ) -> Result<Self, HostbotError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| HostbotError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secrets,
        })
    }

    /// Build a client from the `[telegram]` config section.
    pub fn from_config(config: &TelegramConfig) -> Result<Self, HostbotError> {
        Self::new(&config.api_base, config.secrets(), config.timeout())
    }

    /// The secret source this client resolves credentials from.
    pub fn secrets(&self) -> &dyn SecretSource {
        self.secrets.as_ref()
    }

    fn credential(&self) -> Result<Credential, HostbotError> {
        secrets::credential(self.secrets.as_ref())
    }

    fn method_url(&self, token: &Credential, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, token.expose(), method)
    }

    /// Send a text message. Returns the delivered message id.
    ///
    /// `parse_mode` is normalized leniently (see [`ParseMode::normalize`]);
    /// `silent` defaults to `false`.
    pub async fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
        parse_mode: Option<&str>,
        silent: Option<bool>,
    ) -> Result<i64, HostbotError> {
        let token = self.credential()?;

        if chat_id.is_empty() || text.is_empty() {
            return Err(HostbotError::Validation(
                "chatId and text are required".to_string(),
            ));
        }

        let body = SendMessageRequest {
            chat_id,
            text,
            parse_mode: ParseMode::normalize(parse_mode),
            disable_notification: silent.unwrap_or(false),
        };

        let sent: SentMessage = self
            .call(&token, "sendMessage", &body)
            .await?
            .ok_or_else(|| HostbotError::Relay(API_ERROR.to_string()))?;

        info!("sendMessage delivered {} to {chat_id}", sent.message_id);
        Ok(sent.message_id)
    }

    /// Register the webhook URL. Re-registering is left to Telegram to judge.
    pub async fn set_webhook(
        &self,
        url: &str,
        secret_token: Option<&str>,
        drop_pending_updates: Option<bool>,
    ) -> Result<(), HostbotError> {
        let token = self.credential()?;

        if url.is_empty() {
            return Err(HostbotError::Validation(
                "Webhook URL is required".to_string(),
            ));
        }

        let body = SetWebhookRequest {
            url,
            secret_token: secret_token.filter(|s| !s.is_empty()),
            drop_pending_updates: drop_pending_updates.unwrap_or(false),
        };

        self.call::<serde_json::Value>(&token, "setWebhook", &body)
            .await?;
        info!("setWebhook registered {url}");
        Ok(())
    }

    /// Remove the webhook. Always attempted; there is nothing to validate.
    pub async fn delete_webhook(
        &self,
        drop_pending_updates: Option<bool>,
    ) -> Result<(), HostbotError> {
        let token = self.credential()?;

        let body = DeleteWebhookRequest {
            drop_pending_updates: drop_pending_updates.unwrap_or(false),
        };

        self.call::<serde_json::Value>(&token, "deleteWebhook", &body)
            .await?;
        info!("deleteWebhook succeeded");
        Ok(())
    }

    /// Fetch the bot's own identity via `getMe`.
    pub async fn get_me(&self) -> Result<BotInfo, HostbotError> {
        let token = self.credential()?;

        let resp = self
            .client
            .get(self.method_url(&token, "getMe"))
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("getMe failed ({status})");
            return Err(HostbotError::Relay(if body.is_empty() {
                STATUS_ERROR.to_string()
            } else {
                body
            }));
        }

        let parsed: TgResponse<BotInfo> = resp.json().await.map_err(transport_error)?;
        match parsed.result {
            Some(info) if parsed.ok => Ok(info),
            _ => Err(HostbotError::Relay(
                parsed
                    .description
                    .unwrap_or_else(|| STATUS_ERROR.to_string()),
            )),
        }
    }

    /// POST a JSON body to a Bot API method and unwrap the envelope.
    ///
    /// Non-2xx or `ok: false` yields Telegram's description (or a generic
    /// message); transport and decode failures yield the underlying error.
    async fn call<T: DeserializeOwned>(
        &self,
        token: &Credential,
        method: &str,
        body: &impl Serialize,
    ) -> Result<Option<T>, HostbotError> {
        let resp = self
            .client
            .post(self.method_url(token, method))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let err = transport_error(e);
                warn!("{method} transport failure: {err}");
                err
            })?;

        let status = resp.status();
        let parsed: TgResponse<T> = resp.json().await.map_err(transport_error)?;

        if !status.is_success() || !parsed.ok {
            let description = parsed
                .description
                .unwrap_or_else(|| API_ERROR.to_string());
            warn!("{method} rejected ({status}): {description}");
            return Err(HostbotError::Relay(description));
        }

        Ok(parsed.result)
    }
}

/// reqwest errors embed the request URL, which carries the bot token.
fn transport_error(err: reqwest::Error) -> HostbotError {
    HostbotError::Relay(err.without_url().to_string())
}

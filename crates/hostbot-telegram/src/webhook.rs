//! Inbound webhook receiver.
//!
//! Telegram redelivers an update whenever the webhook answers non-2xx, so
//! once the secret check passes every outcome is acknowledged and relay
//! failures are only logged.

use crate::client::BotApi;
use crate::commands::Command;
use crate::types::{ChatId, Update};
use hostbot_core::config::CommandReplies;
use hostbot_core::error::HostbotError;
use hostbot_core::secrets;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Header Telegram uses to echo the registered `secret_token`.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Answers the fixed bot commands through the Bot API.
pub struct WebhookReceiver {
    api: Arc<BotApi>,
    replies: CommandReplies,
}

impl WebhookReceiver {
    pub fn new(api: Arc<BotApi>, replies: CommandReplies) -> Self {
        Self { api, replies }
    }

    /// Check the secret header against the configured secret.
    ///
    /// With no secret configured every request is accepted.
    pub fn verify(&self, header: Option<&str>) -> Result<(), HostbotError> {
        let Some(expected) = secrets::webhook_secret(self.api.secrets()) else {
            return Ok(());
        };

        match header {
            Some(value) if constant_time_eq(value, &expected) => Ok(()),
            _ => {
                warn!("webhook rejected: secret header missing or mismatched");
                Err(HostbotError::Auth("Invalid secret".to_string()))
            }
        }
    }

    /// Classify an update and relay the canned reply, if any.
    ///
    /// Returns the command that was answered (or attempted). Never fails.
    pub async fn handle(&self, update: &Update) -> Option<Command> {
        if let Some(ref cb) = update.callback_query {
            debug!(
                "update {}: ignoring callback query {} from {}",
                update.update_id, cb.id, cb.from.id
            );
        }

        let message = update.message.as_ref()?;
        let command = Command::parse(message.text.as_deref()?)?;
        let chat_id = ChatId::Id(message.chat.id);

        match self
            .api
            .send_message(&chat_id, command.reply(&self.replies), None, None)
            .await
        {
            Ok(message_id) => info!(
                "update {}: answered {} in chat {chat_id} ({message_id})",
                update.update_id,
                command.name()
            ),
            Err(e) => warn!(
                "update {}: failed to answer {} in chat {chat_id}: {e}",
                update.update_id,
                command.name()
            ),
        }

        Some(command)
    }
}

/// Constant-time string comparison for the shared secret.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

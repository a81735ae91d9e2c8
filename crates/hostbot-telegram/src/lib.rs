//! # hostbot-telegram
//!
//! Thin relay over the Telegram Bot API (`sendMessage`, `getMe`,
//! `setWebhook`, `deleteWebhook`) plus the inbound webhook receiver that
//! answers the fixed bot commands.
//! Docs: <https://core.telegram.org/bots/api>

pub mod client;
pub mod commands;
pub mod types;
pub mod webhook;

pub use client::BotApi;
pub use commands::Command;
pub use types::{BotInfo, ChatId, ParseMode, Update};
pub use webhook::{WebhookReceiver, SECRET_HEADER};

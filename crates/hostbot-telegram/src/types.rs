//! Telegram Bot API wire types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Envelope returned by every Bot API method.
#[derive(Debug, Deserialize)]
pub(crate) struct TgResponse<T> {
    #[serde(default)]
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

/// Target chat: a numeric id or an `@channelusername` handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Handle(String),
}

impl ChatId {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Handle(h) if h.is_empty())
    }
}

impl Default for ChatId {
    fn default() -> Self {
        Self::Handle(String::new())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Handle(h) => f.write_str(h),
        }
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(handle: &str) -> Self {
        Self::Handle(handle.to_string())
    }
}

/// Message formatting mode accepted by `sendMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Markdown,
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
}

impl ParseMode {
    /// Lenient normalization: `"None"`, empty, absent, or any unknown value
    /// means plain text. Matching is case-sensitive.
    pub fn normalize(mode: Option<&str>) -> Option<Self> {
        match mode? {
            "Markdown" => Some(Self::Markdown),
            "MarkdownV2" => Some(Self::MarkdownV2),
            "HTML" => Some(Self::Html),
            _ => None,
        }
    }
}

// --- Outbound request bodies ---

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub chat_id: &'a ChatId,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    pub disable_notification: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SetWebhookRequest<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<&'a str>,
    pub drop_pending_updates: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteWebhookRequest {
    pub drop_pending_updates: bool,
}

// --- Results ---

#[derive(Debug, Deserialize)]
pub(crate) struct SentMessage {
    pub message_id: i64,
}

/// `getMe` result. Fields the dashboard does not know about are kept in
/// `extra` so the info is passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotInfo {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub can_join_groups: bool,
    #[serde(default)]
    pub can_read_all_group_messages: bool,
    #[serde(default)]
    pub supports_inline_queries: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// --- Inbound update ---

/// An update pushed to the webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    /// "private", "group", "supergroup", or "channel".
    #[serde(default, rename = "type")]
    pub chat_type: String,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

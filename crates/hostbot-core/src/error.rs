use thiserror::Error;

/// Top-level error type for hostbot.
///
/// Every kind displays as its bare message so the dashboard can show
/// Telegram's own description verbatim.
#[derive(Debug, Error)]
pub enum HostbotError {
    /// Missing or unreadable configuration (e.g. no bot token).
    #[error("{0}")]
    Config(String),

    /// A required caller-supplied field is missing.
    #[error("{0}")]
    Validation(String),

    /// Inbound webhook secret mismatch.
    #[error("{0}")]
    Auth(String),

    /// The Bot API reported a failure or could not be reached.
    #[error("{0}")]
    Relay(String),
}

impl HostbotError {
    /// Whether the caller is at fault (bad input or bad credentials).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Auth(_))
    }
}

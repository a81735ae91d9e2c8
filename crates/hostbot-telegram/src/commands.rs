//! Fixed inbound bot commands with canned replies.

use hostbot_core::config::CommandReplies;

/// Known bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Host,
}

impl Command {
    /// Exact match on the trimmed, lowercased text. Arguments, `@botname`
    /// suffixes, and anything else fall through to `None`.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "/start" => Some(Self::Start),
            "/help" => Some(Self::Help),
            "/host" => Some(Self::Host),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "/start",
            Self::Help => "/help",
            Self::Host => "/host",
        }
    }

    /// The reply text for this command.
    pub fn reply(self, replies: &CommandReplies) -> &str {
        match self {
            Self::Start => &replies.start,
            Self::Help => &replies.help,
            Self::Host => &replies.host,
        }
    }
}

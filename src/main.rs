mod api;
mod dashboard;

use clap::{Parser, Subcommand};
use hostbot_core::config;
use hostbot_telegram::{BotApi, ChatId};
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hostbot",
    version,
    about = "Dashboard and webhook relay for a Telegram bot"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard and webhook server.
    Serve,
    /// Show the bot identity reported by Telegram.
    Status,
    /// Send a one-shot message.
    Send {
        /// Numeric chat id or @channel handle.
        #[arg(allow_negative_numbers = true)]
        chat_id: String,
        /// The message to send. Words are joined with spaces; put `--`
        /// before text that starts with a dash.
        #[arg(required = true)]
        text: Vec<String>,
        /// Markdown, MarkdownV2 or HTML.
        #[arg(long)]
        parse_mode: Option<String>,
        /// Deliver without a notification sound.
        #[arg(long)]
        silent: bool,
    },
    /// Register the webhook URL with Telegram.
    SetWebhook {
        url: String,
        /// Secret Telegram echoes back in the webhook header.
        #[arg(long)]
        secret: Option<String>,
        #[arg(long)]
        drop_pending: bool,
    },
    /// Remove the webhook.
    DeleteWebhook {
        #[arg(long)]
        drop_pending: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let from_file = config::read(&cli.config)?;
    let found = from_file.is_some();
    let cfg = from_file.unwrap_or_default();
    let _guard = init_logging(&cfg.server.log_dir);
    if !found {
        info!("Config file not found at {}, using defaults", cli.config);
    }

    let bot = BotApi::from_config(&cfg.telegram)?;

    match cli.command {
        Commands::Serve => {
            let state = api::ApiState::new(Arc::new(bot), cfg.commands.clone());
            api::serve(&cfg.server, state).await?;
        }
        Commands::Status => {
            let info = bot.get_me().await?;
            println!("hostbot status\n");
            println!("Config: {}", cli.config);
            println!("  name:           {}", info.first_name);
            println!(
                "  username:       {}",
                info.username
                    .as_deref()
                    .map(|u| format!("@{u}"))
                    .unwrap_or_else(|| "-".to_string())
            );
            println!("  id:             {}", info.id);
            println!("  joins groups:   {}", yes_no(info.can_join_groups));
            println!(
                "  reads groups:   {}",
                yes_no(info.can_read_all_group_messages)
            );
            println!("  inline queries: {}", yes_no(info.supports_inline_queries));
        }
        Commands::Send {
            chat_id,
            text,
            parse_mode,
            silent,
        } => {
            let chat_id = parse_chat_id(&chat_id);
            let text = text.join(" ");
            let message_id = bot
                .send_message(&chat_id, &text, parse_mode.as_deref(), Some(silent))
                .await?;
            println!("sent message {message_id} to {chat_id}");
        }
        Commands::SetWebhook {
            url,
            secret,
            drop_pending,
        } => {
            bot.set_webhook(&url, secret.as_deref(), Some(drop_pending))
                .await?;
            println!("webhook set to {url}");
        }
        Commands::DeleteWebhook { drop_pending } => {
            bot.delete_webhook(Some(drop_pending)).await?;
            println!("webhook deleted");
        }
    }

    Ok(())
}

/// Stderr logging, plus a daily-rotated file when `log_dir` is set.
///
/// The returned guard flushes the file writer on drop and must outlive `main`.
fn init_logging(log_dir: &str) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if log_dir.is_empty() {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr)
            .init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(log_dir, "hostbot.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();
    Some(guard)
}

/// Numeric ids go out as numbers; anything else as a handle string.
fn parse_chat_id(raw: &str) -> ChatId {
    raw.trim()
        .parse::<i64>()
        .map(ChatId::Id)
        .unwrap_or_else(|_| ChatId::from(raw.trim()))
}

fn yes_no(v: bool) -> &'static str {
    if v {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_id() {
        assert_eq!(parse_chat_id("42"), ChatId::Id(42));
        assert_eq!(parse_chat_id("-1001234"), ChatId::Id(-1001234));
        assert_eq!(parse_chat_id("@channel"), ChatId::from("@channel"));
    }

    #[test]
    fn test_cli_parses_send() {
        let cli = Cli::try_parse_from([
            "hostbot",
            "send",
            "--silent",
            "42",
            "hello",
            "world",
        ])
        .unwrap();
        match cli.command {
            Commands::Send { chat_id, text, silent, .. } => {
                assert_eq!(chat_id, "42");
                assert_eq!(text, vec!["hello", "world"]);
                assert!(silent);
            }
            _ => panic!("expected send"),
        }
        assert_eq!(cli.config, "config.toml");
    }

    #[test]
    fn test_cli_parses_send_flags_after_text() {
        let cli = Cli::try_parse_from([
            "hostbot",
            "send",
            "42",
            "hello",
            "world",
            "--silent",
            "--parse-mode",
            "HTML",
        ])
        .unwrap();
        match cli.command {
            Commands::Send {
                chat_id,
                text,
                parse_mode,
                silent,
            } => {
                assert_eq!(chat_id, "42");
                assert_eq!(text, vec!["hello", "world"]);
                assert_eq!(parse_mode.as_deref(), Some("HTML"));
                assert!(silent);
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_cli_send_dash_text_after_separator() {
        let cli = Cli::try_parse_from(["hostbot", "send", "-1001234", "--", "--silent", "is", "text"])
            .unwrap();
        match cli.command {
            Commands::Send {
                chat_id,
                text,
                silent,
                ..
            } => {
                assert_eq!(parse_chat_id(&chat_id), ChatId::Id(-1001234));
                assert_eq!(text, vec!["--silent", "is", "text"]);
                assert!(!silent);
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_cli_send_requires_text() {
        assert!(Cli::try_parse_from(["hostbot", "send", "42"]).is_err());
    }
}

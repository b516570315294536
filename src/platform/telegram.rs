use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tracing::{info, warn};

use crate::error::SendError;
use crate::llm::YandexGptClient;
use crate::platform::{Chat, ChatKind, InboundMessage, Sender};
use crate::relay::{greeting, Relay};

/// Telegram rejects messages over 4096 chars; leave some headroom
const MAX_MESSAGE_LEN: usize = 4000;

pub type BotRelay = Relay<YandexGptClient>;

/// Split long messages for Telegram's 4096 char limit
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

/// [`Sender`] backed by the Bot API
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Sender for TelegramSender {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            self.bot
                .send_message(ChatId(chat_id), chunk)
                .await
                .map_err(|e| SendError {
                    chat_id,
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }

    async fn typing(&self, chat_id: i64) {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .ok();
    }
}

/// Use the configured mention, or ask Telegram for the bot's username.
pub async fn resolve_mention(bot: &Bot, configured: Option<String>) -> Result<String> {
    if let Some(mention) = configured {
        return Ok(mention);
    }
    let me = bot
        .get_me()
        .await
        .context("Failed to fetch bot identity from Telegram")?;
    let username = me
        .user
        .username
        .clone()
        .context("Bot account has no username; set BOT_MENTION")?;
    Ok(format!("@{}", username))
}

/// Run the Telegram long-polling dispatcher until the process is stopped
pub async fn run(bot: Bot, relay: Arc<BotRelay>) -> Result<()> {
    info!("Starting Telegram dispatcher...");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![relay])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// `/start`, or `/start@<this bot>`; commands addressed to other bots are skipped.
fn is_start_command(text: &str, mention: &str) -> bool {
    match text.split_whitespace().next() {
        Some("/start") => true,
        Some(cmd) => cmd
            .strip_prefix("/start")
            .is_some_and(|target| target.eq_ignore_ascii_case(mention)),
        None => false,
    }
}

async fn handle_message(bot: Bot, msg: Message, relay: Arc<BotRelay>) -> ResponseResult<()> {
    let text = match msg.text() {
        Some(t) => t.to_string(),
        None => return Ok(()),
    };

    let sender_name = match msg.from.as_ref() {
        Some(user) => user
            .username
            .clone()
            .unwrap_or_else(|| user.first_name.clone()),
        None => "there".to_string(),
    };

    if is_start_command(&text, relay.mention()) {
        bot.send_message(msg.chat.id, greeting(&sender_name)).await?;
        info!("Greeting sent to chat {}", msg.chat.id);
        return Ok(());
    }

    let kind = if msg.chat.is_private() {
        ChatKind::Private
    } else {
        ChatKind::Group
    };

    let inbound = InboundMessage {
        chat: Chat {
            id: msg.chat.id.0,
            kind,
        },
        sender_name,
        text,
    };

    let sender = TelegramSender::new(bot);
    relay.handle(&inbound, &sender).await;

    Ok(())
}

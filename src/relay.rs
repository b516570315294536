use tracing::{error, info, warn};

use crate::error::RelayError;
use crate::llm::CompletionClient;
use crate::platform::{ChatKind, InboundMessage, Sender};

/// Characters allowed between a leading mention and the prompt, e.g. `@bot, hi`
const MENTION_SEPARATORS: &[char] = &[',', ':', ';'];

/// Forwards chat text to the completion API and sends the answer back.
/// Stateless across messages; share it behind an `Arc`.
pub struct Relay<C> {
    client: C,
    mention: String,
}

impl<C: CompletionClient> Relay<C> {
    pub fn new(client: C, mention: String) -> Self {
        Self { client, mention }
    }

    pub fn mention(&self) -> &str {
        &self.mention
    }

    pub fn is_mentioned(&self, text: &str) -> bool {
        !mention_spans(text, &self.mention).is_empty()
    }

    /// Prompt to forward for `msg`, or `None` if the bot should stay silent.
    pub fn prompt_for(&self, msg: &InboundMessage) -> Option<String> {
        match msg.chat.kind {
            ChatKind::Private => Some(msg.text.clone()),
            ChatKind::Group => {
                if !self.is_mentioned(&msg.text) {
                    return None;
                }
                Some(strip_mention(&msg.text, &self.mention))
            }
        }
    }

    /// Prompt to completion text.
    pub async fn answer(&self, prompt: &str) -> Result<String, RelayError> {
        if prompt.trim().is_empty() {
            return Err(RelayError::EmptyMessage);
        }
        self.client.complete(prompt).await
    }

    /// Handle one inbound message end to end. Never fails: relay errors are
    /// turned into a chat reply, send failures are logged.
    pub async fn handle(&self, msg: &InboundMessage, sender: &dyn Sender) {
        info!(
            "Message from {} in chat {}: {}",
            msg.sender_name, msg.chat.id, msg.text
        );

        let prompt = match self.prompt_for(msg) {
            Some(p) => p,
            None => {
                info!(
                    "Group message without {} in chat {}, ignoring",
                    self.mention, msg.chat.id
                );
                return;
            }
        };

        sender.typing(msg.chat.id).await;

        let reply = match self.answer(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Relay failed for chat {}: {}", msg.chat.id, e);
                error_reply(&e)
            }
        };

        match sender.send(msg.chat.id, &reply).await {
            Ok(()) => info!("Reply sent to chat {}", msg.chat.id),
            Err(e) => error!("{}", e),
        }
    }
}

fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Byte ranges where `mention` appears as a whole username, ignoring ASCII case.
/// `@BotFan` is another account and does not match `@Bot`.
fn mention_spans(text: &str, mention: &str) -> Vec<(usize, usize)> {
    let needle = mention.to_ascii_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    // ASCII lowercasing keeps byte offsets identical to `text`
    let haystack = text.to_ascii_lowercase();
    haystack
        .match_indices(&needle)
        .map(|(start, m)| (start, start + m.len()))
        .filter(|&(_, end)| !text[end..].chars().next().is_some_and(is_username_char))
        .collect()
}

/// Remove every mention of the bot, then any leading whitespace and
/// separators and any trailing whitespace.
pub fn strip_mention(text: &str, mention: &str) -> String {
    let mut rest = String::with_capacity(text.len());
    let mut last = 0;
    for (start, end) in mention_spans(text, mention) {
        rest.push_str(&text[last..start]);
        last = end;
    }
    rest.push_str(&text[last..]);

    rest.trim_start_matches(|c: char| c.is_whitespace() || MENTION_SEPARATORS.contains(&c))
        .trim_end()
        .to_string()
}

/// Chat-visible text for a relay failure.
pub fn error_reply(err: &RelayError) -> String {
    format!("An error occurred: {}", err)
}

/// Greeting for `/start`.
pub fn greeting(sender_name: &str) -> String {
    format!(
        "Hello, {}!\n\
         I'm a bot with Yandex GPT quietly plugged in. It answers every message except this one.\n\
         In groups, mention me to get a reply.",
        sender_name
    )
}

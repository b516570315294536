pub mod telegram;

use async_trait::async_trait;

use crate::error::SendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    /// Groups, supergroups and channels
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chat {
    pub id: i64,
    pub kind: ChatKind,
}

/// A text message received from the transport
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat: Chat,
    /// Display name of the sender
    pub sender_name: String,
    pub text: String,
}

/// Outbound side of the transport
#[async_trait]
pub trait Sender: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), SendError>;

    /// Hint that a reply is being prepared. Best effort.
    async fn typing(&self, _chat_id: i64) {}
}

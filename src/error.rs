use thiserror::Error;

/// Startup-only configuration failure. Fatal: the process exits with status 1.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("Failed to read config file {path}: {reason}")]
    File { path: String, reason: String },
}

/// Failures of a single relay round trip. Each one ends up as a chat message.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RelayError {
    #[error("Message text is empty")]
    EmptyMessage,

    #[error("Request to the model API failed: {0}")]
    Request(String),

    #[error("The model returned no text in its response")]
    EmptyResponse,
}

#[derive(Debug, Error)]
#[error("Failed to send message to chat {chat_id}: {reason}")]
pub struct SendError {
    pub chat_id: i64,
    pub reason: String,
}

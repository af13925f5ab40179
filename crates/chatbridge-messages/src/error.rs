//! Error types for the chat side.

use thiserror::Error;

/// Result type for chat operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a chat platform.
#[derive(Debug, Error)]
pub enum Error {
    /// Topic does not follow `<Namespace>/<GroupID>/<Direction>`.
    #[error("Invalid topic '{topic}': {reason}")]
    InvalidTopic { topic: String, reason: String },

    /// Send operation failed.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Bot API returned an error or an unreadable body.
    #[error("Telegram API error: {0}")]
    Telegram(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl Error {
    pub(crate) fn invalid_topic(topic: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTopic {
            topic: topic.to_string(),
            reason: reason.into(),
        }
    }
}

//! Error types for the bot crate.

use thiserror::Error;

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while answering a chat message.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Chat error: {0}")]
    Chat(#[from] chatbridge_messages::Error),
}

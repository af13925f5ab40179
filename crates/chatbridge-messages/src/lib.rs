//! Chat side of ChatBridge.
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `telegram` | ✅ | Telegram Bot API gateway |
//!
//! ## Contents
//!
//! - **Topics**: `<Namespace>/<GroupID>/<Direction>` parsing and building
//! - **Replies**: plain text or `[header/button/...]` keyboard payloads
//! - **Channels**: `ChatSink` with broker and in-memory implementations
//! - **Telegram**: long-polling gateway between a bot and the broker

pub mod channels;
pub mod error;
pub mod reply;
#[cfg(feature = "telegram")]
pub mod telegram;
pub mod topic;

pub use channels::{ChatSink, MemoryChatSink, MqttChatSink, SharedChatSink};
pub use error::{Error, Result};
pub use reply::{ChatReply, MAX_SUGGESTIONS};
pub use topic::{ChatTopic, Direction, TopicPattern};

#[cfg(feature = "telegram")]
pub use telegram::{BotApi, TelegramClient, TelegramGateway};

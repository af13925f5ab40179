//! Outbound chat channels.
//!
//! The bot only needs `send_text(group_id, text)`; how the text reaches the
//! chat group is up to the sink.

pub mod memory;
pub mod mqtt;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::MemoryChatSink;
pub use mqtt::MqttChatSink;

/// Delivers bot replies to a chat group.
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Get the sink name.
    fn name(&self) -> &str;

    /// Send a reply payload to one group.
    async fn send_text(&self, group_id: &str, text: &str) -> Result<()>;
}

/// Shared sink handle.
pub type SharedChatSink = Arc<dyn ChatSink>;

//! Broker transport contract.
//!
//! The core never manages broker sessions. Components receive inbound
//! messages as [`InboundMessage`] values and publish through a [`Publisher`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// A payload delivered on a broker topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: String,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Build from raw bytes, replacing invalid UTF-8.
    pub fn from_bytes(topic: impl Into<String>, payload: &[u8]) -> Self {
        Self::new(topic, String::from_utf8_lossy(payload).into_owned())
    }
}

/// Publish side of the broker.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()>;
}

/// Shared publisher handle.
pub type SharedPublisher = Arc<dyn Publisher>;

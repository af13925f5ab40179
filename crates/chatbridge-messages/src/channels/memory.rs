//! In-memory chat sink (for testing).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::ChatSink;
use crate::error::{Error, Result};

/// A reply captured by [`MemoryChatSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReply {
    pub group_id: String,
    pub text: String,
}

/// Records every reply instead of delivering it.
#[derive(Debug, Clone)]
pub struct MemoryChatSink {
    name: String,
    enabled: bool,
    sent: Arc<Mutex<Vec<SentReply>>>,
}

impl MemoryChatSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A sink whose sends fail, for exercising error paths.
    pub fn disabled(name: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::new(name)
        }
    }

    pub async fn sent(&self) -> Vec<SentReply> {
        self.sent.lock().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl ChatSink for MemoryChatSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_text(&self, group_id: &str, text: &str) -> Result<()> {
        if !self.enabled {
            return Err(Error::SendFailed(format!("sink '{}' is disabled", self.name)));
        }
        self.sent.lock().await.push(SentReply {
            group_id: group_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}

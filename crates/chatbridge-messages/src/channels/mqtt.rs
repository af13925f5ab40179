//! Chat sink that publishes to the broker.
//!
//! Replies go to the bot-to-chat topic with the group id substituted, where
//! the chat gateway picks them up.

use async_trait::async_trait;
use chatbridge_core::SharedPublisher;

use super::ChatSink;
use crate::error::{Error, Result};
use crate::topic::{Direction, TopicPattern};

pub struct MqttChatSink {
    publisher: SharedPublisher,
    pattern: TopicPattern,
}

impl MqttChatSink {
    /// `pattern` must be the bot-to-chat (`Tx`) side.
    pub fn new(publisher: SharedPublisher, pattern: TopicPattern) -> Result<Self> {
        if pattern.direction() != Direction::Tx {
            return Err(Error::InvalidConfiguration(format!(
                "chat replies must use a {} topic, got {}",
                Direction::Tx,
                pattern.direction()
            )));
        }
        Ok(Self { publisher, pattern })
    }

    /// Build from the `TeleDstTopic` template.
    pub fn from_template(publisher: SharedPublisher, template: &str) -> Result<Self> {
        Self::new(publisher, TopicPattern::from_template(template)?)
    }
}

#[async_trait]
impl ChatSink for MqttChatSink {
    fn name(&self) -> &str {
        "mqtt"
    }

    async fn send_text(&self, group_id: &str, text: &str) -> Result<()> {
        let topic = self.pattern.topic_for(group_id);
        tracing::debug!("Publish: {}: {}", topic, text);
        self.publisher
            .publish(&topic, text)
            .await
            .map_err(|e| Error::SendFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbridge_core::Publisher;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingPublisher {
        sent: parking_lot::Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish(&self, topic: &str, payload: &str) -> chatbridge_core::Result<()> {
            self.sent.lock().push((topic.to_string(), payload.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_publishes_to_group_topic() {
        let publisher = Arc::new(RecordingPublisher::default());
        let sink = MqttChatSink::from_template(publisher.clone(), "Telegram/GroupID/Tx").unwrap();

        sink.send_text("-1001", "Light is on").await.unwrap();

        assert_eq!(
            publisher.sent.lock().as_slice(),
            &[("Telegram/-1001/Tx".to_string(), "Light is on".to_string())]
        );
    }

    #[test]
    fn test_rejects_rx_template() {
        let publisher = Arc::new(RecordingPublisher::default());
        assert!(MqttChatSink::from_template(publisher, "Telegram/GroupID/Rx").is_err());
    }
}

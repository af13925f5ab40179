//! Outbound device transport and topic routing.

use std::collections::HashMap;

use async_trait::async_trait;
use chatbridge_core::{DeviceKind, MqttConfig, SharedPublisher};

use crate::error::{Error, Result};

/// Sends command payloads to a device.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn send(&self, kind: DeviceKind, payload: &str) -> Result<()>;
}

/// Command and reply topics per device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTopics {
    /// Bot to device.
    commands: HashMap<DeviceKind, String>,
    /// Device to bot.
    replies: HashMap<DeviceKind, String>,
}

impl DeviceTopics {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            replies: HashMap::new(),
        }
    }

    pub fn from_config(config: &MqttConfig) -> Self {
        Self::new()
            .with_device(
                DeviceKind::Led,
                &config.led_device_dst_topic,
                &config.led_device_src_topic,
            )
            .with_device(
                DeviceKind::Sensor,
                &config.sensor_device_dst_topic,
                &config.sensor_device_src_topic,
            )
    }

    pub fn with_device(
        mut self,
        kind: DeviceKind,
        command_topic: impl Into<String>,
        reply_topic: impl Into<String>,
    ) -> Self {
        self.commands.insert(kind, command_topic.into());
        self.replies.insert(kind, reply_topic.into());
        self
    }

    pub fn command_topic(&self, kind: DeviceKind) -> Option<&str> {
        self.commands.get(&kind).map(String::as_str)
    }

    pub fn reply_topic(&self, kind: DeviceKind) -> Option<&str> {
        self.replies.get(&kind).map(String::as_str)
    }

    /// Device whose replies arrive on `topic`.
    pub fn device_for_reply(&self, topic: &str) -> Option<DeviceKind> {
        self.replies
            .iter()
            .find(|(_, reply)| reply.as_str() == topic)
            .map(|(kind, _)| *kind)
    }

    /// All reply topics, for subscribing.
    pub fn reply_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.replies.values().cloned().collect();
        topics.sort();
        topics.dedup();
        topics
    }
}

impl Default for DeviceTopics {
    fn default() -> Self {
        Self::new()
    }
}

/// Publishes device commands on their broker topics.
pub struct BrokerDeviceTransport {
    publisher: SharedPublisher,
    topics: DeviceTopics,
}

impl BrokerDeviceTransport {
    pub fn new(publisher: SharedPublisher, topics: DeviceTopics) -> Self {
        Self { publisher, topics }
    }

    pub fn topics(&self) -> &DeviceTopics {
        &self.topics
    }
}

#[async_trait]
impl DeviceTransport for BrokerDeviceTransport {
    async fn send(&self, kind: DeviceKind, payload: &str) -> Result<()> {
        let topic = self
            .topics
            .command_topic(kind)
            .ok_or(Error::UnknownDevice(kind))?;

        tracing::debug!("Sending '{}' to {} device on {}", payload, kind, topic);
        self.publisher
            .publish(topic, payload)
            .await
            .map_err(|e| Error::Transport(e.to_string()))
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

    #[test]
    fn test_topics_from_config() {
        let topics = DeviceTopics::from_config(&MqttConfig::new("localhost"));
        assert_eq!(topics.command_topic(DeviceKind::Led), Some("LedDevice/Tx"));
        assert_eq!(topics.device_for_reply("TestSensor/Rx"), Some(DeviceKind::Sensor));
        assert_eq!(topics.device_for_reply("Telegram/1/Rx"), None);
        assert_eq!(topics.reply_topics(), vec!["LedDevice/Rx", "TestSensor/Rx"]);
    }

    #[tokio::test]
    async fn test_send_publishes_on_command_topic() {
        let publisher = Arc::new(RecordingPublisher::default());
        let topics = DeviceTopics::new().with_device(DeviceKind::Led, "led/cmd", "led/reply");
        let transport = BrokerDeviceTransport::new(publisher.clone(), topics);

        transport.send(DeviceKind::Led, "LED_ON").await.unwrap();
        assert_eq!(
            publisher.sent.lock().as_slice(),
            &[("led/cmd".to_string(), "LED_ON".to_string())]
        );

        let err = transport.send(DeviceKind::Sensor, "HUMP").await.unwrap_err();
        assert!(matches!(err, Error::UnknownDevice(DeviceKind::Sensor)));
    }
}

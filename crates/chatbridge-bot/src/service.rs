//! Bot service: routes broker traffic to the dispatcher and correlator.
//!
//! Device replies are handed to the correlator's reply slot. Chat messages
//! are dispatched on their own task, so a slow device never holds up the
//! inbound stream.

use std::sync::Arc;

use chatbridge_core::InboundMessage;
use chatbridge_devices::{DeviceTopics, ResponseCorrelator};
use chatbridge_messages::TopicPattern;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::dispatcher::Dispatcher;

pub struct BotService {
    dispatcher: Arc<Dispatcher>,
    correlator: Arc<ResponseCorrelator>,
    chat_rx: TopicPattern,
    device_topics: DeviceTopics,
}

impl BotService {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        correlator: Arc<ResponseCorrelator>,
        chat_rx: TopicPattern,
        device_topics: DeviceTopics,
    ) -> Self {
        Self {
            dispatcher,
            correlator,
            chat_rx,
            device_topics,
        }
    }

    /// Broker subscriptions the bot needs: every chat group plus every
    /// device reply topic.
    pub fn subscriptions(chat_rx: &TopicPattern, device_topics: &DeviceTopics) -> Vec<String> {
        let mut topics = vec![chat_rx.filter()];
        topics.extend(device_topics.reply_topics());
        topics
    }

    /// Route one inbound message.
    ///
    /// Returns the dispatch task for chat messages.
    pub fn handle_message(&self, message: InboundMessage) -> Option<JoinHandle<()>> {
        if let Some(kind) = self.device_topics.device_for_reply(&message.topic) {
            tracing::debug!("Reply from {} device: [{}]", kind, message.payload);
            self.correlator.deposit(kind, message.payload);
            return None;
        }

        let topic = match self.chat_rx.parse(&message.topic) {
            Ok(topic) => topic,
            Err(e) => {
                tracing::warn!("Dropping message: {}", e);
                return None;
            }
        };

        let dispatcher = self.dispatcher.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = dispatcher.handle(&topic.group_id, &message.payload).await {
                tracing::warn!("Failed to answer group {}: {}", topic.group_id, e);
            }
        }))
    }

    /// Route messages until the broker stream closes.
    pub async fn run(&self, mut inbound: mpsc::Receiver<InboundMessage>) {
        tracing::info!(
            "Bot service started with {} commands",
            self.dispatcher.registry().len()
        );
        while let Some(message) = inbound.recv().await {
            self.handle_message(message);
        }
        tracing::info!("Broker stream closed, stopping bot service");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbridge_core::DeviceKind;

    #[test]
    fn test_subscriptions() {
        let chat_rx = TopicPattern::from_template("Telegram/GroupID/Rx").unwrap();
        let topics = DeviceTopics::new()
            .with_device(DeviceKind::Led, "LedDevice/Tx", "LedDevice/Rx")
            .with_device(DeviceKind::Sensor, "TestSensor/Tx", "TestSensor/Rx");

        assert_eq!(
            BotService::subscriptions(&chat_rx, &topics),
            vec!["Telegram/+/Rx", "LedDevice/Rx", "TestSensor/Rx"]
        );
    }
}

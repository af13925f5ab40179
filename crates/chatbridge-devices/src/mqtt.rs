//! MQTT broker client using rumqttc.
//!
//! [`MqttClient::connect`] returns the publish handle together with a
//! receiver of every message delivered on the requested subscriptions.
//! Subscriptions are (re)issued on each `ConnAck`, so they survive broker
//! reconnects with a clean session.

use std::time::Duration;

use async_trait::async_trait;
use chatbridge_core::{InboundMessage, MqttConfig, Publisher};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Capacity of the inbound message queue.
pub const INBOUND_CAPACITY: usize = 100;

/// Connected broker session.
#[derive(Clone)]
pub struct MqttClient {
    client: AsyncClient,
    client_id: String,
}

impl MqttClient {
    /// Connect to the broker and subscribe to `subscriptions`.
    ///
    /// `role` distinguishes the generated client id of the bot, gateway,
    /// bridge and simulator processes.
    pub async fn connect(
        config: &MqttConfig,
        role: &str,
        subscriptions: Vec<String>,
    ) -> Result<(Self, mpsc::Receiver<InboundMessage>)> {
        let (host, port) = config.host_port()?;
        let client_id = config.client_id.clone().unwrap_or_else(|| {
            format!("chatbridge_{}_{}", role, &uuid::Uuid::new_v4().simple().to_string()[..8])
        });

        let mut options = MqttOptions::new(&client_id, &host, port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        if let Some(user) = &config.user {
            options.set_credentials(user, config.password.as_deref().unwrap_or_default());
        }

        let (client, mut eventloop) = AsyncClient::new(options, 10);
        let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);

        tracing::info!("Connecting MQTT client '{}' to {}:{}", client_id, host, port);

        let subscriber = client.clone();
        let loop_id = client_id.clone();
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        tracing::info!("MQTT client '{}' connected", loop_id);
                        for topic in &subscriptions {
                            if let Err(e) = subscriber.try_subscribe(topic.as_str(), QoS::AtLeastOnce) {
                                tracing::error!("Failed to subscribe to {}: {}", topic, e);
                            } else {
                                tracing::debug!("Subscribed to {}", topic);
                            }
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let message = InboundMessage::from_bytes(publish.topic, &publish.payload);
                        tracing::debug!(
                            "Received message: [{}] from topic: {}",
                            message.payload,
                            message.topic
                        );
                        if tx.send(message).await.is_err() {
                            tracing::debug!("Inbound receiver dropped, stopping '{}'", loop_id);
                            break;
                        }
                    }
                    Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) => {
                        tracing::info!("MQTT client '{}' disconnected", loop_id);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("MQTT client '{}' error: {}", loop_id, e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Ok((Self { client, client_id }, rx))
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Publish a payload with QoS 0.
    pub async fn publish_text(&self, topic: &str, payload: &str) -> Result<()> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .await
            .map_err(|e| Error::Mqtt(format!("publish to {} failed: {}", topic, e)))
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.client
            .disconnect()
            .await
            .map_err(|e| Error::Mqtt(e.to_string()))
    }
}

#[async_trait]
impl Publisher for MqttClient {
    async fn publish(&self, topic: &str, payload: &str) -> chatbridge_core::Result<()> {
        self.publish_text(topic, payload)
            .await
            .map_err(|e| chatbridge_core::Error::Transport(e.to_string()))
    }
}

//! Sensor node simulator.
//!
//! Stands in for a measurement device during development: every received
//! command bumps a counter, `HUMP` answers with the counter and `TEMP`
//! answers with a fixed temperature.

use chatbridge_core::config::SensorConfig;
use chatbridge_core::{InboundMessage, Publisher};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Humidity request.
pub const HUMIDITY_COMMAND: &str = "HUMP";
/// Temperature request.
pub const TEMPERATURE_COMMAND: &str = "TEMP";
/// Reading returned for every temperature request.
pub const TEMPERATURE_READING: &str = "26";

#[derive(Debug, Clone)]
pub struct SensorSimulator {
    value: i64,
    command_topic: String,
    reply_topic: String,
}

impl SensorSimulator {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            value: config.initial_value,
            command_topic: config.command_topic.clone(),
            reply_topic: config.reply_topic.clone(),
        }
    }

    pub fn command_topic(&self) -> &str {
        &self.command_topic
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    /// Reply to one command, if it is one the node understands.
    pub fn respond(&mut self, command: &str) -> Option<String> {
        self.value += 1;
        match command.trim() {
            HUMIDITY_COMMAND => Some(self.value.to_string()),
            TEMPERATURE_COMMAND => Some(TEMPERATURE_READING.to_string()),
            _ => None,
        }
    }

    /// Answer commands until the inbound stream closes.
    pub async fn run(
        &mut self,
        publisher: &dyn Publisher,
        mut inbound: mpsc::Receiver<InboundMessage>,
    ) -> Result<()> {
        while let Some(message) = inbound.recv().await {
            if message.topic != self.command_topic {
                continue;
            }
            if let Some(reply) = self.respond(&message.payload) {
                publisher
                    .publish(&self.reply_topic, &reply)
                    .await
                    .map_err(|e| Error::Transport(e.to_string()))?;
                tracing::info!("Publish: {}: {}", self.reply_topic, reply);
            }
        }
        Ok(())
    }
}

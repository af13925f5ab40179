//! Device response correlation.
//!
//! [`ResponseCorrelator::invoke`] sends a command to the device that serves
//! it and waits a bounded time for the reply, turning the outcome into a
//! [`ResponseKey`]:
//!
//! | Outcome | Key |
//! |---------|-----|
//! | no reply before the deadline | `Timeout` |
//! | reply to a measurement command | `Data(value)` |
//! | any other reply | `Device(reply)` |
//!
//! A timeout is a normal outcome, not an error. Only a failed send is
//! reported as `Err`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chatbridge_core::{CommandDescriptor, DeviceKind, ResponseKey};

use crate::channel::DeviceChannel;
use crate::error::{Error, Result};
use crate::transport::DeviceTransport;

pub struct ResponseCorrelator {
    transport: Arc<dyn DeviceTransport>,
    channels: HashMap<DeviceKind, Arc<DeviceChannel>>,
    timeout: Duration,
}

impl ResponseCorrelator {
    /// Create a correlator with one reply channel per device kind.
    pub fn new(transport: Arc<dyn DeviceTransport>, timeout: Duration) -> Self {
        let channels = DeviceKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::new(DeviceChannel::new(kind))))
            .collect();

        Self {
            transport,
            channels,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn channel(&self, kind: DeviceKind) -> Option<Arc<DeviceChannel>> {
        self.channels.get(&kind).cloned()
    }

    /// Deliver a reply received from a device.
    pub fn deposit(&self, kind: DeviceKind, reply: impl Into<String>) -> bool {
        match self.channels.get(&kind) {
            Some(channel) => channel.deposit(reply),
            None => false,
        }
    }

    /// Send the descriptor's command and wait for the correlated reply.
    ///
    /// Requests to the same device are serialized; the device is held from
    /// before the send until the reply or the deadline.
    pub async fn invoke(&self, descriptor: &CommandDescriptor) -> Result<ResponseKey> {
        let kind = descriptor.device_kind();
        let channel = self.channels.get(&kind).ok_or(Error::UnknownDevice(kind))?;

        let mut pending = channel.lock().await;
        pending.discard_stale();

        self.transport.send(kind, &descriptor.device_command).await?;

        let key = match pending.wait(self.timeout).await {
            None => {
                tracing::info!(
                    "No reply from {} device to '{}' within {:?}",
                    kind,
                    descriptor.device_command,
                    self.timeout
                );
                ResponseKey::Timeout
            }
            Some(reply) => {
                let reply = reply.trim().to_string();
                if descriptor.is_measurement() {
                    ResponseKey::Data(reply)
                } else {
                    ResponseKey::Device(reply)
                }
            }
        };

        tracing::debug!("Command '{}' resolved to {}", descriptor.chat_command, key);
        Ok(key)
    }
}

//! ChatBridge Device Crate
//!
//! Everything between the bot and the physical devices.
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `mqtt` | ✅ | rumqttc broker client |
//!
//! ## Architecture
//!
//! - **DeviceTransport**: outbound command path, one topic per device
//! - **DeviceChannel**: single-slot reply rendezvous with a per-device lock
//! - **ResponseCorrelator**: send + bounded wait, mapped to a `ResponseKey`
//! - **SerialBridge**: broker to line-oriented serial device
//! - **SensorSimulator**: stand-in measurement node

pub mod channel;
pub mod correlator;
pub mod error;
#[cfg(feature = "mqtt")]
pub mod mqtt;
pub mod serial;
pub mod simulator;
pub mod transport;

pub use channel::{DeviceChannel, PendingRequest};
pub use correlator::ResponseCorrelator;
pub use error::{Error, Result};
#[cfg(feature = "mqtt")]
pub use mqtt::MqttClient;
pub use serial::SerialBridge;
pub use simulator::SensorSimulator;
pub use transport::{BrokerDeviceTransport, DeviceTopics, DeviceTransport};

pub use chatbridge_core::{DeviceKind, ResponseKey};

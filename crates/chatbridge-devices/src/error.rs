//! Error types for device operations.

use chatbridge_core::DeviceKind;
use thiserror::Error;

/// Result type for device operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No channel or topic is configured for the device.
    #[error("Unknown device: {0}")]
    UnknownDevice(DeviceKind),

    /// Sending to the device failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Broker client error.
    #[error("MQTT error: {0}")]
    Mqtt(String),

    /// Serial port IO failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port could not be opened or configured.
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    #[error(transparent)]
    Core(#[from] chatbridge_core::Error),
}

//! Error types for the core crate.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading configuration or talking to the broker.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is present but unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid YAML for the expected schema.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Broker publish or subscribe failed.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

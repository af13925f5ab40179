//! Core types for ChatBridge.
//!
//! This crate holds the decision logic shared by every component:
//! - **normalize**: case and diacritic folding
//! - **registry**: bilingual chat command tables
//! - **matcher**: fuzzy command matching with match tiers
//! - **config**: YAML configuration and startup validation
//! - **transport**: broker publish contract

pub mod config;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod registry;
pub mod transport;

pub use config::{BridgeConfig, CommandConfig, CommandSource, MqttConfig};
pub use error::{Error, Result};
pub use matcher::{FuzzyMatcher, MatchResult, MatchTier, ScoredCandidate};
pub use normalize::normalize;
pub use registry::{
    CommandDescriptor, CommandRegistry, DeviceKind, Language, RegistryBuilder, ResponseKey,
    DATA_KEY, TIMEOUT_KEY,
};
pub use transport::{InboundMessage, Publisher, SharedPublisher};

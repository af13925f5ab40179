//! ChatBridge bot.
//!
//! Wires the matcher, registry and correlator into a [`Dispatcher`] and
//! serves it from the broker with [`BotService`].

pub mod dispatcher;
pub mod error;
pub mod service;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{Error, Result};
pub use service::BotService;

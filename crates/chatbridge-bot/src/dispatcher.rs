//! Chat command dispatcher.
//!
//! Each chat message runs once through:
//!
//! ```text
//! Matching ─┬─ NoMatch ─▶ Help     (bilingual header + every command)
//!           ├─ Close   ─▶ Suggest  (top candidates with their scores)
//!           └─ Exact   ─▶ Execute  (device round trip, templated reply)
//! ```
//!
//! Nothing is kept between messages.

use std::sync::Arc;

use chatbridge_core::config::message_keys;
use chatbridge_core::{
    CommandRegistry, FuzzyMatcher, Language, MatchResult, MatchTier, ResponseKey, ScoredCandidate,
};
use chatbridge_devices::ResponseCorrelator;
use chatbridge_messages::{ChatReply, SharedChatSink, MAX_SUGGESTIONS};

use crate::error::Result;

/// What the dispatcher did with one message.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// No command was close enough; the command list was sent.
    Help,
    /// The best candidates were offered for confirmation.
    Suggest {
        language: Language,
        candidates: Vec<ScoredCandidate>,
    },
    /// A command ran on its device.
    Executed {
        command: String,
        /// `None` when the command could not be sent.
        key: Option<ResponseKey>,
        text: String,
    },
}

pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    matcher: FuzzyMatcher,
    correlator: Arc<ResponseCorrelator>,
    chat: SharedChatSink,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<CommandRegistry>,
        matcher: FuzzyMatcher,
        correlator: Arc<ResponseCorrelator>,
        chat: SharedChatSink,
    ) -> Self {
        Self {
            registry,
            matcher,
            correlator,
            chat,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn matcher(&self) -> &FuzzyMatcher {
        &self.matcher
    }

    /// Match a chat message and act on the result.
    pub async fn handle(&self, group_id: &str, text: &str) -> Result<DispatchOutcome> {
        let result = self.matcher.match_command(text, self.registry.chat_commands());
        tracing::info!(
            "[{}] '{}' -> '{}' ({:.2} %, {})",
            group_id,
            text,
            result.candidate,
            result.similarity,
            result.tier
        );

        match result.tier {
            MatchTier::NoMatch => {
                self.chat.send_text(group_id, &self.help_reply().encode()).await?;
                Ok(DispatchOutcome::Help)
            }
            MatchTier::Close => {
                let (language, reply) = self.suggest_reply(&result);
                self.chat.send_text(group_id, &reply.encode()).await?;
                Ok(DispatchOutcome::Suggest {
                    language,
                    candidates: result.top(MAX_SUGGESTIONS).to_vec(),
                })
            }
            MatchTier::Exact => self.execute(group_id, &result.candidate).await,
        }
    }

    /// Help listing with both language headers.
    pub fn help_reply(&self) -> ChatReply {
        ChatReply::help(
            self.message(message_keys::HELP_VN),
            self.message(message_keys::HELP_EN),
            self.registry.chat_commands(),
        )
    }

    /// Suggestion prompt, headed in the language of the best candidate.
    pub fn suggest_reply(&self, result: &MatchResult) -> (Language, ChatReply) {
        let language = self
            .registry
            .language_of(&result.candidate)
            .unwrap_or(Language::English);
        let reply = ChatReply::suggestions(
            self.message(language.suggest_key()),
            result.top(MAX_SUGGESTIONS),
        );
        (language, reply)
    }

    async fn execute(&self, group_id: &str, command: &str) -> Result<DispatchOutcome> {
        let (key, text) = match self.registry.resolve(command) {
            None => {
                tracing::warn!("Matched '{}' but no table holds it", command);
                (None, self.registry.error_message().to_string())
            }
            Some(descriptor) => match self.correlator.invoke(descriptor).await {
                Ok(key) => {
                    let text = descriptor.render(&key).unwrap_or_else(|| {
                        tracing::warn!("'{}' has no template for reply '{}'", command, key);
                        self.registry.error_message().to_string()
                    });
                    (Some(key), text)
                }
                Err(e) => {
                    tracing::warn!("Failed to send '{}': {}", descriptor.device_command, e);
                    (None, self.registry.error_message().to_string())
                }
            },
        };

        self.chat.send_text(group_id, &text).await?;
        Ok(DispatchOutcome::Executed {
            command: command.to_string(),
            key,
            text,
        })
    }

    fn message(&self, key: &str) -> &str {
        self.registry.message(key).unwrap_or_default()
    }
}

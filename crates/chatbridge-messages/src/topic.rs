//! Chat topic codec.
//!
//! Chat traffic travels on topics shaped `<Namespace>/<GroupID>/<Direction>`,
//! for example `Telegram/-1001234/Rx`. A [`TopicPattern`] is built from the
//! configured template (with the literal `GroupID` segment) and is used both
//! to build concrete topics and to pull the group id back out of them.

use std::fmt;
use std::str::FromStr;

use chatbridge_core::config::GROUP_ID_PLACEHOLDER;

use crate::error::{Error, Result};

/// Flow direction relative to the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Chat to bot.
    Rx,
    /// Bot to chat.
    Tx,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Rx => "Rx",
            Direction::Tx => "Tx",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Rx" => Ok(Direction::Rx),
            "Tx" => Ok(Direction::Tx),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

/// A parsed chat topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTopic {
    pub namespace: String,
    pub group_id: String,
    pub direction: Direction,
}

impl ChatTopic {
    /// Numeric chat id, as the Telegram Bot API expects it.
    pub fn chat_id(&self) -> Result<i64> {
        self.group_id.parse::<i64>().map_err(|_| {
            Error::invalid_topic(&self.to_string(), "group id is not a numeric chat id")
        })
    }
}

impl fmt::Display for ChatTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.group_id, self.direction)
    }
}

/// Expected namespace and direction of one side of the chat traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPattern {
    namespace: String,
    direction: Direction,
}

impl TopicPattern {
    pub fn new(namespace: impl Into<String>, direction: Direction) -> Self {
        Self {
            namespace: namespace.into(),
            direction,
        }
    }

    /// Build a pattern from a template such as `Telegram/GroupID/Rx`.
    pub fn from_template(template: &str) -> Result<Self> {
        let segments: Vec<&str> = template.split('/').collect();
        match segments.as_slice() {
            [namespace, group, direction] if *group == GROUP_ID_PLACEHOLDER => {
                let direction = direction
                    .parse::<Direction>()
                    .map_err(|reason| Error::InvalidConfiguration(format!("{}: {}", template, reason)))?;
                Ok(Self::new(*namespace, direction))
            }
            _ => Err(Error::InvalidConfiguration(format!(
                "chat topic template '{}' must look like <Namespace>/{}/<Rx|Tx>",
                template, GROUP_ID_PLACEHOLDER
            ))),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Concrete topic for one group.
    pub fn topic_for(&self, group_id: &str) -> String {
        format!("{}/{}/{}", self.namespace, group_id, self.direction)
    }

    /// Single-level wildcard subscription covering every group.
    pub fn filter(&self) -> String {
        self.topic_for("+")
    }

    /// Parse a received topic, rejecting the wrong namespace or direction.
    pub fn parse(&self, topic: &str) -> Result<ChatTopic> {
        let segments: Vec<&str> = topic.split('/').collect();
        let [namespace, group_id, direction] = segments.as_slice() else {
            return Err(Error::invalid_topic(topic, "expected three segments"));
        };

        if *namespace != self.namespace {
            return Err(Error::invalid_topic(
                topic,
                format!("expected namespace '{}'", self.namespace),
            ));
        }

        if *direction != self.direction.as_str() {
            return Err(Error::invalid_topic(
                topic,
                format!("expected direction '{}'", self.direction),
            ));
        }

        if group_id.is_empty() {
            return Err(Error::invalid_topic(topic, "empty group id"));
        }

        Ok(ChatTopic {
            namespace: namespace.to_string(),
            group_id: group_id.to_string(),
            direction: self.direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_template() {
        let rx = TopicPattern::from_template("Telegram/GroupID/Rx").unwrap();
        assert_eq!(rx.namespace(), "Telegram");
        assert_eq!(rx.direction(), Direction::Rx);
        assert_eq!(rx.filter(), "Telegram/+/Rx");
        assert_eq!(rx.topic_for("-42"), "Telegram/-42/Rx");

        assert!(TopicPattern::from_template("Telegram/Rx").is_err());
        assert!(TopicPattern::from_template("Telegram/Group/Rx").is_err());
        assert!(TopicPattern::from_template("Telegram/GroupID/Up").is_err());
    }

    #[test]
    fn test_parse() {
        let rx = TopicPattern::new("Telegram", Direction::Rx);
        let topic = rx.parse("Telegram/-1001/Rx").unwrap();
        assert_eq!(topic.group_id, "-1001");
        assert_eq!(topic.chat_id().unwrap(), -1001);
        assert_eq!(topic.to_string(), "Telegram/-1001/Rx");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let rx = TopicPattern::new("Telegram", Direction::Rx);
        for topic in ["Slack/1/Rx", "Telegram/1/Tx", "Telegram/1", "Telegram//Rx", "a/b/c/d"] {
            let err = rx.parse(topic).unwrap_err();
            assert!(matches!(err, Error::InvalidTopic { .. }), "{}", topic);
        }
    }

    #[test]
    fn test_non_numeric_chat_id() {
        let tx = TopicPattern::new("Telegram", Direction::Tx);
        let topic = tx.parse("Telegram/ops/Tx").unwrap();
        assert!(topic.chat_id().is_err());
    }
}

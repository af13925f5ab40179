//! Chat reply payload codec.
//!
//! Plain replies travel as-is. Replies that carry selectable commands are
//! bracketed and slash-separated:
//!
//! ```text
//! [<header>/<button 1>/<button 2>...]
//! ```
//!
//! The chat gateway renders the header as the message text and each button
//! on its own row, with the button text as callback data.

use chatbridge_core::ScoredCandidate;

/// Maximum number of suggestions offered for a close match.
pub const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Text(String),
    Keyboard { text: String, buttons: Vec<String> },
}

impl ChatReply {
    pub fn text(text: impl Into<String>) -> Self {
        ChatReply::Text(text.into())
    }

    /// Help listing: both language headers, then every command.
    pub fn help<'a>(
        header_vn: &str,
        header_en: &str,
        commands: impl IntoIterator<Item = &'a String>,
    ) -> Self {
        ChatReply::Keyboard {
            text: format!("{}\n{}", header_vn, header_en),
            buttons: commands.into_iter().cloned().collect(),
        }
    }

    /// Suggestions for a close match, each annotated with its score.
    ///
    /// The annotation is cut off again before matching, so tapping a
    /// suggestion resolves to its command exactly.
    pub fn suggestions(header: &str, candidates: &[ScoredCandidate]) -> Self {
        ChatReply::Keyboard {
            text: header.to_string(),
            buttons: candidates
                .iter()
                .take(MAX_SUGGESTIONS)
                .map(|c| format!("{} ({:.2} %)", c.command, c.similarity))
                .collect(),
        }
    }

    /// Wire form published to the chat topic.
    pub fn encode(&self) -> String {
        match self {
            ChatReply::Text(text) => text.clone(),
            ChatReply::Keyboard { text, buttons } => {
                let mut payload = format!("[{}", text);
                for button in buttons {
                    payload.push('/');
                    payload.push_str(button);
                }
                payload.push(']');
                payload
            }
        }
    }

    pub fn decode(payload: &str) -> Self {
        let inner = payload
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'));

        match inner {
            Some(inner) => {
                let mut parts = inner.split('/');
                let text = parts.next().unwrap_or_default().to_string();
                let buttons = parts
                    .filter(|b| !b.is_empty())
                    .map(str::to_string)
                    .collect();
                ChatReply::Keyboard { text, buttons }
            }
            None => ChatReply::Text(payload.to_string()),
        }
    }

    pub fn message_text(&self) -> &str {
        match self {
            ChatReply::Text(text) => text,
            ChatReply::Keyboard { text, .. } => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_layout() {
        let commands = vec!["đèn".to_string(), "light".to_string()];
        let reply = ChatReply::help("Các lệnh", "Commands", &commands);
        assert_eq!(reply.encode(), "[Các lệnh\nCommands/đèn/light]");
    }

    #[test]
    fn test_suggestions_capped_and_annotated() {
        let candidates: Vec<_> = [("den", 85.0), ("sen", 66.666), ("led", 66.666), ("off", 0.0)]
            .into_iter()
            .map(|(command, similarity)| ScoredCandidate {
                command: command.to_string(),
                similarity,
            })
            .collect();

        let reply = ChatReply::suggestions("Did you mean", &candidates);
        assert_eq!(
            reply.encode(),
            "[Did you mean/den (85.00 %)/sen (66.67 %)/led (66.67 %)]"
        );
    }

    #[test]
    fn test_decode() {
        assert_eq!(
            ChatReply::decode("[Pick one/a/b]"),
            ChatReply::Keyboard {
                text: "Pick one".to_string(),
                buttons: vec!["a".to_string(), "b".to_string()],
            }
        );
        assert_eq!(ChatReply::decode("Light is on"), ChatReply::text("Light is on"));
        assert_eq!(ChatReply::decode("[unterminated"), ChatReply::text("[unterminated"));
        assert_eq!(ChatReply::decode("").message_text(), "");
    }
}

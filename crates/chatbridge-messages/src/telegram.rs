//! Telegram Bot API gateway.
//!
//! Connects a Telegram bot to the broker:
//! - text messages and inline-button taps are published to the chat-to-bot
//!   topic of their chat;
//! - payloads on the bot-to-chat topics are sent to the chat named in the
//!   topic, as plain text or as a message with an inline keyboard.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatbridge_core::config::TelegramConfig;
use chatbridge_core::{InboundMessage, SharedPublisher};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::reply::ChatReply;
use crate::topic::{Direction, TopicPattern};

/// One entry of a `getUpdates` response.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct InlineKeyboardButton<'a> {
    text: &'a str,
    callback_data: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct InlineKeyboardMarkup<'a> {
    inline_keyboard: Vec<Vec<InlineKeyboardButton<'a>>>,
}

#[derive(Debug, Clone, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup<'a>>,
}

impl<'a> SendMessageRequest<'a> {
    /// One button per row; the callback data is the button text.
    fn new(chat_id: i64, reply: &'a ChatReply) -> Self {
        match reply {
            ChatReply::Text(text) => Self {
                chat_id,
                text: text.as_str(),
                reply_markup: None,
            },
            ChatReply::Keyboard { text, buttons } => Self {
                chat_id,
                text: text.as_str(),
                reply_markup: Some(InlineKeyboardMarkup {
                    inline_keyboard: buttons
                        .iter()
                        .map(|button| {
                            vec![InlineKeyboardButton {
                                text: button.as_str(),
                                callback_data: button.as_str(),
                            }]
                        })
                        .collect(),
                }),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if !self.ok {
            return Err(Error::Telegram(format!(
                "{} failed: {}",
                method,
                self.description.unwrap_or_else(|| "no description".to_string())
            )));
        }
        self.result
            .ok_or_else(|| Error::Telegram(format!("{} returned no result", method)))
    }
}

/// The Bot API calls the gateway relies on.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Long-poll for updates starting at `offset`.
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>>;

    async fn send_message(&self, chat_id: i64, reply: &ChatReply) -> Result<()>;

    /// Acknowledge an inline-button tap so the client stops its spinner.
    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()>;
}

/// HTTP client for the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(Error::InvalidConfiguration("TelegramConfig.BotToken is empty".to_string()));
        }

        // Long polls hold the request open for `poll_timeout_secs`.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()
            .map_err(|e| Error::Telegram(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.bot_token
            ),
        })
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Telegram(format!("{} request failed: {}", method, e.without_url())))?;

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Telegram(format!("{} returned an unreadable body: {}", method, e.without_url())))?;
        body.into_result(method)
    }

    /// The bot's own account.
    pub async fn get_me(&self) -> Result<BotUser> {
        self.call("getMe", &serde_json::json!({})).await
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &serde_json::json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    async fn send_message(&self, chat_id: i64, reply: &ChatReply) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendMessage", &SendMessageRequest::new(chat_id, reply))
            .await?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &serde_json::json!({ "callback_query_id": callback_query_id }),
            )
            .await?;
        Ok(())
    }
}

/// Bridges a Telegram bot and the broker.
pub struct TelegramGateway {
    api: Arc<dyn BotApi>,
    publisher: SharedPublisher,
    src: TopicPattern,
    dst: TopicPattern,
    poll_timeout_secs: u64,
}

impl TelegramGateway {
    /// `src_template` is the chat-to-bot topic, `dst_template` the
    /// bot-to-chat topic.
    pub fn new(
        api: Arc<dyn BotApi>,
        publisher: SharedPublisher,
        src_template: &str,
        dst_template: &str,
        poll_timeout_secs: u64,
    ) -> Result<Self> {
        let src = TopicPattern::from_template(src_template)?;
        let dst = TopicPattern::from_template(dst_template)?;
        if src.direction() != Direction::Rx || dst.direction() != Direction::Tx {
            return Err(Error::InvalidConfiguration(format!(
                "expected {} -> Rx and {} -> Tx",
                src_template, dst_template
            )));
        }

        Ok(Self {
            api,
            publisher,
            src,
            dst,
            poll_timeout_secs,
        })
    }

    /// Broker subscriptions the gateway needs for a bot-to-chat template.
    pub fn subscriptions(dst_template: &str) -> Result<Vec<String>> {
        Ok(vec![TopicPattern::from_template(dst_template)?.filter()])
    }

    /// Publish one chat input to the bot.
    async fn forward(&self, chat_id: i64, text: &str) -> Result<()> {
        let topic = self.src.topic_for(&chat_id.to_string());
        self.publisher
            .publish(&topic, text)
            .await
            .map_err(|e| Error::SendFailed(e.to_string()))?;
        tracing::info!("{}: {}", topic, text);
        Ok(())
    }

    /// Handle one update from `getUpdates`.
    pub async fn handle_update(&self, update: Update) -> Result<()> {
        if let Some(message) = update.message {
            if let Some(text) = message.text {
                return self.forward(message.chat.id, &text).await;
            }
            tracing::debug!("Ignoring non-text message {}", message.message_id);
            return Ok(());
        }

        if let Some(query) = update.callback_query {
            // An expired query still carries the tapped suggestion.
            if let Err(e) = self.api.answer_callback_query(&query.id).await {
                tracing::warn!("Failed to answer callback query {}: {}", query.id, e);
            }
            match (query.message, query.data) {
                (Some(message), Some(data)) => return self.forward(message.chat.id, &data).await,
                _ => tracing::debug!("Callback query {} carries no chat or data", query.id),
            }
        }

        Ok(())
    }

    /// Send one bot reply from the broker to its chat.
    pub async fn deliver(&self, message: &InboundMessage) -> Result<()> {
        let chat_id = self.dst.parse(&message.topic)?.chat_id()?;
        let reply = ChatReply::decode(&message.payload);
        self.api.send_message(chat_id, &reply).await?;
        tracing::debug!("Sent reply to chat {}", chat_id);
        Ok(())
    }

    async fn poll_updates(&self) -> Result<()> {
        let mut offset = 0;
        loop {
            match self.api.get_updates(offset, self.poll_timeout_secs).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if let Err(e) = self.handle_update(update).await {
                            tracing::warn!("Failed to handle update: {}", e);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("getUpdates failed: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    async fn deliver_replies(&self, mut inbound: mpsc::Receiver<InboundMessage>) -> Result<()> {
        while let Some(message) = inbound.recv().await {
            if let Err(e) = self.deliver(&message).await {
                tracing::warn!("Dropping reply on {}: {}", message.topic, e);
            }
        }
        tracing::info!("Broker stream closed, stopping Telegram gateway");
        Ok(())
    }

    /// Poll Telegram and deliver replies until the broker stream closes.
    pub async fn run(&self, inbound: mpsc::Receiver<InboundMessage>) -> Result<()> {
        tokio::select! {
            result = self.poll_updates() => result,
            result = self.deliver_replies(inbound) => result,
        }
    }
}

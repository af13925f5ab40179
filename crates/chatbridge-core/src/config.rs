//! Configuration model and YAML loading.
//!
//! A single YAML file feeds every component. Section and field names follow
//! the PascalCase keys used by deployed configuration files:
//!
//! ```yaml
//! MqttConfig:
//!   Broker: tcp://localhost:1883
//!   User: bot
//!   Password: secret
//!   LedDeviceDstTopic: LedDevice/Tx
//!   LedDeviceSrcTopic: LedDevice/Rx
//! CmdConfig:
//!   DeviceCmdCodeArrVN:
//!     - ChatCmd: bật đèn
//!       DeviceCmd: LED_ON
//!       ChatResponseMap: { "ON": "Đèn đã bật" }
//!   DeviceCmdCodeArrEN: []
//!   DefaultRespMsg: { ErrorCmd: "..." }
//!   TickTimeout: 5
//!   StringRateThreshold: 70
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Placeholder segment substituted with a chat group id in topic templates.
pub const GROUP_ID_PLACEHOLDER: &str = "GroupID";

/// Separator of the `[header/button/...]` chat reply payload. It may not
/// appear in chat commands or reply headers.
pub const REPLY_SEPARATOR: char = '/';

/// Longest chat command, in bytes, whose suggestion button `"<cmd> (100.00 %)"`
/// still fits Telegram's 64-byte `callback_data`.
pub const MAX_CHAT_COMMAND_BYTES: usize = 64 - " (100.00 %)".len();

/// Default-message keys that must be present in `DefaultRespMsg`.
pub mod message_keys {
    pub const ERROR_CMD: &str = "ErrorCmd";
    pub const TIMEOUT_VN: &str = "TimeoutVN";
    pub const TIMEOUT_EN: &str = "TimeoutEN";
    pub const HELP_VN: &str = "ResponseHelpVN";
    pub const HELP_EN: &str = "ResponseHelpEN";
    pub const SUGGEST_VN: &str = "SuggestVN";
    pub const SUGGEST_EN: &str = "SuggestEN";

    pub const REQUIRED: [&str; 7] = [
        ERROR_CMD, TIMEOUT_VN, TIMEOUT_EN, HELP_VN, HELP_EN, SUGGEST_VN, SUGGEST_EN,
    ];
}

/// Root of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BridgeConfig {
    pub mqtt_config: MqttConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd_config: Option<CommandConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_config: Option<TelegramConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_config: Option<SerialConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_config: Option<SensorConfig>,
}

impl BridgeConfig {
    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&raw)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// The command section, required by the bot.
    pub fn commands(&self) -> Result<&CommandConfig> {
        self.cmd_config
            .as_ref()
            .ok_or_else(|| Error::config("missing CmdConfig section"))
    }

    /// The Telegram section, required by the chat gateway.
    pub fn telegram(&self) -> Result<&TelegramConfig> {
        self.telegram_config
            .as_ref()
            .ok_or_else(|| Error::config("missing TelegramConfig section"))
    }

    /// The serial section, required by the serial bridge.
    pub fn serial(&self) -> Result<&SerialConfig> {
        self.serial_config
            .as_ref()
            .ok_or_else(|| Error::config("missing SerialConfig section"))
    }

    /// The sensor simulator section, falling back to defaults.
    pub fn sensor(&self) -> SensorConfig {
        self.sensor_config.clone().unwrap_or_default()
    }
}

/// Broker connection settings and topic layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MqttConfig {
    /// Broker address: `tcp://host:port`, `mqtt://host:port` or `host[:port]`.
    pub broker: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// Chat to bot, e.g. `Telegram/GroupID/Rx`.
    #[serde(default = "default_tele_src_topic")]
    pub tele_src_topic: String,
    /// Bot to chat, e.g. `Telegram/GroupID/Tx`.
    #[serde(default = "default_tele_dst_topic")]
    pub tele_dst_topic: String,

    #[serde(default = "default_led_src_topic")]
    pub led_device_src_topic: String,
    #[serde(default = "default_led_dst_topic")]
    pub led_device_dst_topic: String,
    #[serde(default = "default_sensor_src_topic")]
    pub sensor_device_src_topic: String,
    #[serde(default = "default_sensor_dst_topic")]
    pub sensor_device_dst_topic: String,
}

fn default_keep_alive() -> u64 {
    60
}

fn default_tele_src_topic() -> String {
    "Telegram/GroupID/Rx".to_string()
}

fn default_tele_dst_topic() -> String {
    "Telegram/GroupID/Tx".to_string()
}

fn default_led_src_topic() -> String {
    "LedDevice/Rx".to_string()
}

fn default_led_dst_topic() -> String {
    "LedDevice/Tx".to_string()
}

fn default_sensor_src_topic() -> String {
    "TestSensor/Rx".to_string()
}

fn default_sensor_dst_topic() -> String {
    "TestSensor/Tx".to_string()
}

impl MqttConfig {
    /// Create a configuration with default topics.
    pub fn new(broker: impl Into<String>) -> Self {
        Self {
            broker: broker.into(),
            user: None,
            password: None,
            client_id: None,
            keep_alive_secs: default_keep_alive(),
            tele_src_topic: default_tele_src_topic(),
            tele_dst_topic: default_tele_dst_topic(),
            led_device_src_topic: default_led_src_topic(),
            led_device_dst_topic: default_led_dst_topic(),
            sensor_device_src_topic: default_sensor_src_topic(),
            sensor_device_dst_topic: default_sensor_dst_topic(),
        }
    }

    /// Split the broker address into host and port.
    pub fn host_port(&self) -> Result<(String, u16)> {
        let addr = self
            .broker
            .trim()
            .trim_start_matches("tcp://")
            .trim_start_matches("mqtt://")
            .trim_end_matches('/');

        if addr.is_empty() {
            return Err(Error::config("MqttConfig.Broker is empty"));
        }

        match addr.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    Error::config(format!("invalid broker port in '{}'", self.broker))
                })?;
                Ok((host.to_string(), port))
            }
            None => Ok((addr.to_string(), 1883)),
        }
    }
}

/// One row of a command table as written in the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommandSource {
    pub chat_cmd: String,
    pub device_cmd: String,
    #[serde(default)]
    pub chat_response_map: HashMap<String, String>,
}

impl CommandSource {
    pub fn new(chat_cmd: impl Into<String>, device_cmd: impl Into<String>) -> Self {
        Self {
            chat_cmd: chat_cmd.into(),
            device_cmd: device_cmd.into(),
            chat_response_map: HashMap::new(),
        }
    }

    /// Add a response template.
    pub fn with_response(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.chat_response_map.insert(key.into(), text.into());
        self
    }
}

/// Command tables and matching parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommandConfig {
    #[serde(rename = "DeviceCmdCodeArrVN", default)]
    pub vietnamese: Vec<CommandSource>,
    #[serde(rename = "DeviceCmdCodeArrEN", default)]
    pub english: Vec<CommandSource>,
    #[serde(default)]
    pub default_resp_msg: HashMap<String, String>,
    /// Seconds to wait for a device reply.
    #[serde(default = "default_tick_timeout")]
    pub tick_timeout: u64,
    /// Minimum similarity percentage for a close match.
    #[serde(default = "default_rate_threshold")]
    pub string_rate_threshold: f32,
}

fn default_tick_timeout() -> u64 {
    5
}

fn default_rate_threshold() -> f32 {
    70.0
}

impl CommandConfig {
    /// Device reply timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.tick_timeout)
    }

    /// Check everything the bot needs before it starts.
    pub fn validate(&self) -> Result<()> {
        for key in message_keys::REQUIRED {
            if !self.default_resp_msg.contains_key(key) {
                return Err(Error::config(format!("DefaultRespMsg is missing '{}'", key)));
            }
        }

        if self.vietnamese.is_empty() && self.english.is_empty() {
            return Err(Error::config("no chat commands configured"));
        }

        if self.tick_timeout == 0 {
            return Err(Error::config("TickTimeout must be positive"));
        }

        if !(self.string_rate_threshold > 0.0 && self.string_rate_threshold <= 100.0) {
            return Err(Error::config(format!(
                "StringRateThreshold must be in (0, 100], got {}",
                self.string_rate_threshold
            )));
        }

        for key in [
            message_keys::HELP_VN,
            message_keys::HELP_EN,
            message_keys::SUGGEST_VN,
            message_keys::SUGGEST_EN,
        ] {
            let header = self.default_resp_msg.get(key);
            if header.is_some_and(|text| text.contains(REPLY_SEPARATOR)) {
                return Err(Error::config(format!(
                    "DefaultRespMsg.{} may not contain '{}'",
                    key, REPLY_SEPARATOR
                )));
            }
        }

        validate_table("DeviceCmdCodeArrVN", &self.vietnamese)?;
        validate_table("DeviceCmdCodeArrEN", &self.english)?;
        Ok(())
    }
}

fn validate_table(name: &str, table: &[CommandSource]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for source in table {
        if source.chat_cmd.trim().is_empty() {
            return Err(Error::config(format!("{}: empty ChatCmd", name)));
        }
        if source.chat_cmd.contains(REPLY_SEPARATOR) {
            return Err(Error::config(format!(
                "{}: ChatCmd '{}' may not contain '{}'",
                name, source.chat_cmd, REPLY_SEPARATOR
            )));
        }
        if source.chat_cmd.len() > MAX_CHAT_COMMAND_BYTES {
            return Err(Error::config(format!(
                "{}: ChatCmd '{}' is longer than {} bytes",
                name, source.chat_cmd, MAX_CHAT_COMMAND_BYTES
            )));
        }
        if !seen.insert(source.chat_cmd.as_str()) {
            return Err(Error::config(format!(
                "{}: duplicate ChatCmd '{}'",
                name, source.chat_cmd
            )));
        }
        if let Some(template) = source.chat_response_map.get(crate::registry::DATA_KEY) {
            if !template.contains(':') {
                return Err(Error::config(format!(
                    "{}: Data template of '{}' needs a ':' label separator",
                    name, source.chat_cmd
                )));
            }
        }
    }
    Ok(())
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_name: String,
    pub bot_token: String,
    #[serde(default)]
    pub id_bot_chat: Option<i64>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

/// Serial line bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SerialConfig {
    pub com_name: String,
    #[serde(default = "default_baudrate")]
    pub baudrate: u32,
    /// Payloads published here are written to the port.
    pub serial_dst_topic: String,
    /// Lines read from the port are published here.
    pub serial_src_topic: String,
}

fn default_baudrate() -> u32 {
    115_200
}

/// Sensor node simulator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SensorConfig {
    #[serde(default = "default_sensor_dst_topic")]
    pub command_topic: String,
    #[serde(default = "default_sensor_src_topic")]
    pub reply_topic: String,
    #[serde(default = "default_initial_value")]
    pub initial_value: i64,
}

fn default_initial_value() -> i64 {
    40
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            command_topic: default_sensor_dst_topic(),
            reply_topic: default_sensor_src_topic(),
            initial_value: default_initial_value(),
        }
    }
}

//! Bilingual command registry.
//!
//! Holds one table per [`Language`], each mapping a canonical chat command
//! to the [`CommandDescriptor`] that drives a device. The registry is built
//! once at startup and only read afterwards, so it is shared behind an `Arc`
//! without locking.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{message_keys, CommandConfig, CommandSource};
use crate::error::{Error, Result};

/// Response key of the template used when the device stays silent.
pub const TIMEOUT_KEY: &str = "Timeout";

/// Response key marking a measurement command.
pub const DATA_KEY: &str = "Data";

/// Language of a command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Vietnamese,
    English,
}

impl Language {
    /// Tables in lookup precedence order.
    pub const ALL: [Language; 2] = [Language::Vietnamese, Language::English];

    /// Default-message key holding this language's timeout text.
    pub fn timeout_key(&self) -> &'static str {
        match self {
            Language::Vietnamese => message_keys::TIMEOUT_VN,
            Language::English => message_keys::TIMEOUT_EN,
        }
    }

    /// Default-message key holding this language's help header.
    pub fn help_key(&self) -> &'static str {
        match self {
            Language::Vietnamese => message_keys::HELP_VN,
            Language::English => message_keys::HELP_EN,
        }
    }

    /// Default-message key holding this language's suggestion header.
    pub fn suggest_key(&self) -> &'static str {
        match self {
            Language::Vietnamese => message_keys::SUGGEST_VN,
            Language::English => message_keys::SUGGEST_EN,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Vietnamese => "VN",
            Language::English => "EN",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Physical device a command is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Actuator that answers with a status key such as `ON`.
    Led,
    /// Measurement node that answers with a raw value.
    Sensor,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 2] = [DeviceKind::Led, DeviceKind::Sensor];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Led => "led",
            DeviceKind::Sensor => "sensor",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a device round trip, used to select a response template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseKey {
    /// No reply before the deadline.
    Timeout,
    /// Measurement reply carrying the raw value.
    Data(String),
    /// Any other reply, used verbatim as a template key.
    Device(String),
}

impl ResponseKey {
    /// Template key this outcome selects.
    pub fn as_key(&self) -> &str {
        match self {
            ResponseKey::Timeout => TIMEOUT_KEY,
            ResponseKey::Data(_) => DATA_KEY,
            ResponseKey::Device(key) => key,
        }
    }
}

impl fmt::Display for ResponseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseKey::Data(value) => write!(f, "{}({})", DATA_KEY, value),
            other => f.write_str(other.as_key()),
        }
    }
}

/// One registered device capability.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDescriptor {
    /// Canonical chat trigger, unique within its table.
    pub chat_command: String,
    /// Opaque payload sent to the device.
    pub device_command: String,
    /// Table this descriptor was registered in.
    pub language: Language,
    /// Response key to user-facing text.
    pub response_templates: HashMap<String, String>,
}

impl CommandDescriptor {
    fn from_source(source: &CommandSource, language: Language, timeout_text: &str) -> Self {
        let mut response_templates = source.chat_response_map.clone();
        response_templates.insert(TIMEOUT_KEY.to_string(), timeout_text.to_string());

        Self {
            chat_command: source.chat_cmd.clone(),
            device_command: source.device_cmd.clone(),
            language,
            response_templates,
        }
    }

    /// Measurement commands are recognised by their `Data` template.
    pub fn is_measurement(&self) -> bool {
        self.response_templates.contains_key(DATA_KEY)
    }

    pub fn device_kind(&self) -> DeviceKind {
        if self.is_measurement() {
            DeviceKind::Sensor
        } else {
            DeviceKind::Led
        }
    }

    pub fn template(&self, key: &str) -> Option<&str> {
        self.response_templates.get(key).map(String::as_str)
    }

    /// Produce the user-facing text for a device outcome.
    ///
    /// A `Data` value is appended to the label preceding the first `:` of
    /// the `Data` template, so `"Humidity: "` with `55` renders
    /// `"Humidity: 55"`. Returns `None` when no template matches.
    pub fn render(&self, key: &ResponseKey) -> Option<String> {
        match key {
            ResponseKey::Data(value) => self.template(DATA_KEY).map(|template| {
                let label = template.split(':').next().unwrap_or_default();
                format!("{}: {}", label, value)
            }),
            other => self.template(other.as_key()).map(str::to_string),
        }
    }
}

/// Registry of both command tables.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    tables: HashMap<Language, HashMap<String, CommandDescriptor>>,
    order: HashMap<Language, Vec<String>>,
    chat_commands: Vec<String>,
    messages: HashMap<String, String>,
}

impl CommandRegistry {
    /// Start building a registry around a set of default messages.
    pub fn builder(messages: HashMap<String, String>) -> RegistryBuilder {
        RegistryBuilder {
            messages,
            tables: HashMap::new(),
            order: HashMap::new(),
        }
    }

    /// Validate a command configuration and register both tables.
    pub fn from_config(config: &CommandConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Self::builder(config.default_resp_msg.clone());
        builder.register(Language::Vietnamese, &config.vietnamese)?;
        builder.register(Language::English, &config.english)?;
        let registry = builder.build();

        tracing::info!(
            "Registered {} chat commands ({} VN, {} EN)",
            registry.len(),
            config.vietnamese.len(),
            config.english.len()
        );
        Ok(registry)
    }

    /// Look up a chat command, Vietnamese table first.
    pub fn resolve(&self, chat_command: &str) -> Option<&CommandDescriptor> {
        Language::ALL
            .iter()
            .find_map(|language| self.lookup(*language, chat_command))
    }

    /// Look up a chat command in one table only.
    pub fn lookup(&self, language: Language, chat_command: &str) -> Option<&CommandDescriptor> {
        self.tables.get(&language)?.get(chat_command)
    }

    /// Table that [`resolve`](Self::resolve) would answer from.
    pub fn language_of(&self, chat_command: &str) -> Option<Language> {
        self.resolve(chat_command).map(|descriptor| descriptor.language)
    }

    /// All chat commands of both tables, VN and EN entries interleaved.
    pub fn chat_commands(&self) -> &[String] {
        &self.chat_commands
    }

    /// Commands of a single table in registration order.
    pub fn table(&self, language: Language) -> impl Iterator<Item = &CommandDescriptor> {
        self.order
            .get(&language)
            .into_iter()
            .flatten()
            .filter_map(move |command| self.lookup(language, command))
    }

    pub fn message(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    /// Registry-wide fallback text for unknown responses.
    pub fn error_message(&self) -> &str {
        self.message(message_keys::ERROR_CMD).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.chat_commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chat_commands.is_empty()
    }
}

/// Startup-only builder for [`CommandRegistry`].
#[derive(Debug)]
pub struct RegistryBuilder {
    messages: HashMap<String, String>,
    tables: HashMap<Language, HashMap<String, CommandDescriptor>>,
    order: HashMap<Language, Vec<String>>,
}

impl RegistryBuilder {
    /// Register one language table.
    ///
    /// Every descriptor receives a `Timeout` template resolved from the
    /// language's default timeout message.
    pub fn register(&mut self, language: Language, sources: &[CommandSource]) -> Result<&mut Self> {
        let timeout_key = language.timeout_key();
        let timeout_text = self
            .messages
            .get(timeout_key)
            .cloned()
            .ok_or_else(|| Error::config(format!("DefaultRespMsg is missing '{}'", timeout_key)))?;

        let table = self.tables.entry(language).or_default();
        let order = self.order.entry(language).or_default();

        for source in sources {
            if table.contains_key(&source.chat_cmd) {
                return Err(Error::config(format!(
                    "duplicate {} chat command '{}'",
                    language, source.chat_cmd
                )));
            }
            let descriptor = CommandDescriptor::from_source(source, language, &timeout_text);
            tracing::debug!(
                "Registered {} command '{}' -> {} ({})",
                language,
                descriptor.chat_command,
                descriptor.device_command,
                descriptor.device_kind()
            );
            order.push(source.chat_cmd.clone());
            table.insert(source.chat_cmd.clone(), descriptor);
        }

        Ok(self)
    }

    /// Freeze the tables.
    pub fn build(self) -> CommandRegistry {
        let empty = Vec::new();
        let vietnamese = self.order.get(&Language::Vietnamese).unwrap_or(&empty);
        let english = self.order.get(&Language::English).unwrap_or(&empty);
        let chat_commands = interleave(vietnamese, english);

        CommandRegistry {
            tables: self.tables,
            order: self.order,
            chat_commands,
            messages: self.messages,
        }
    }
}

/// `a0, b0, a1, b1, ...` followed by the surplus of the longer list.
fn interleave(first: &[String], second: &[String]) -> Vec<String> {
    let mut merged = Vec::with_capacity(first.len() + second.len());
    for i in 0..first.len().max(second.len()) {
        if let Some(command) = first.get(i) {
            merged.push(command.clone());
        }
        if let Some(command) = second.get(i) {
            merged.push(command.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages() -> HashMap<String, String> {
        [
            ("ErrorCmd", "Lỗi lệnh"),
            ("TimeoutVN", "Hết thời gian"),
            ("TimeoutEN", "Timed out"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn registry() -> CommandRegistry {
        let vn = vec![
            CommandSource::new("bật đèn", "LED_ON").with_response("ON", "Đèn đã bật"),
            CommandSource::new("độ ẩm", "HUMP").with_response("Data", "Độ ẩm: %"),
            CommandSource::new("led", "LED_TOGGLE").with_response("OK", "Đã đổi"),
        ];
        let en = vec![
            CommandSource::new("turn on", "LED_ON").with_response("ON", "Light is on"),
            CommandSource::new("led", "LED_TOGGLE").with_response("OK", "Toggled"),
        ];

        let mut builder = CommandRegistry::builder(messages());
        builder.register(Language::Vietnamese, &vn).unwrap();
        builder.register(Language::English, &en).unwrap();
        builder.build()
    }

    #[test]
    fn test_timeout_template_injected_per_language() {
        let registry = registry();
        let vn = registry.lookup(Language::Vietnamese, "bật đèn").unwrap();
        let en = registry.lookup(Language::English, "turn on").unwrap();
        assert_eq!(vn.template(TIMEOUT_KEY), Some("Hết thời gian"));
        assert_eq!(en.template(TIMEOUT_KEY), Some("Timed out"));
    }

    #[test]
    fn test_flat_list_interleaves_tables() {
        let registry = registry();
        assert_eq!(
            registry.chat_commands(),
            &["bật đèn", "turn on", "độ ẩm", "led", "led"]
        );
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_resolve_prefers_vietnamese() {
        let registry = registry();
        let led = registry.resolve("led").unwrap();
        assert_eq!(led.language, Language::Vietnamese);
        assert_eq!(led.template("OK"), Some("Đã đổi"));

        assert_eq!(registry.language_of("turn on"), Some(Language::English));
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn test_device_kind_is_structural() {
        let registry = registry();
        assert_eq!(registry.resolve("độ ẩm").unwrap().device_kind(), DeviceKind::Sensor);
        assert_eq!(registry.resolve("bật đèn").unwrap().device_kind(), DeviceKind::Led);
    }

    #[test]
    fn test_render() {
        let registry = registry();
        let sensor = registry.resolve("độ ẩm").unwrap();
        assert_eq!(
            sensor.render(&ResponseKey::Data("55".to_string())).as_deref(),
            Some("Độ ẩm: 55")
        );
        assert_eq!(sensor.render(&ResponseKey::Timeout).as_deref(), Some("Hết thời gian"));

        let led = registry.resolve("bật đèn").unwrap();
        assert_eq!(
            led.render(&ResponseKey::Device("ON".to_string())).as_deref(),
            Some("Đèn đã bật")
        );
        assert!(led.render(&ResponseKey::Device("OFF".to_string())).is_none());
        assert!(led.render(&ResponseKey::Data("1".to_string())).is_none());
    }

    #[test]
    fn test_render_is_stable_across_requests() {
        let descriptor = CommandDescriptor::from_source(
            &CommandSource::new("humidity", "HUMP").with_response("Data", "Humidity: "),
            Language::English,
            "Timed out",
        );
        let first = descriptor.render(&ResponseKey::Data("55".to_string()));
        let second = descriptor.render(&ResponseKey::Data("56".to_string()));
        assert_eq!(first.as_deref(), Some("Humidity: 55"));
        assert_eq!(second.as_deref(), Some("Humidity: 56"));
    }

    #[test]
    fn test_register_rejects_missing_timeout_and_duplicates() {
        let mut builder = CommandRegistry::builder(HashMap::new());
        assert!(builder.register(Language::English, &[]).is_err());

        let mut builder = CommandRegistry::builder(messages());
        let dup = vec![CommandSource::new("a", "A"), CommandSource::new("a", "B")];
        assert!(builder.register(Language::English, &dup).is_err());
    }

    #[test]
    fn test_table_iterates_in_registration_order() {
        let registry = registry();
        let en: Vec<_> = registry
            .table(Language::English)
            .map(|d| d.chat_command.as_str())
            .collect();
        assert_eq!(en, vec!["turn on", "led"]);
    }
}

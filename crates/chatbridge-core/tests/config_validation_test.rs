//! Configuration Validation Tests
//!
//! Covers loading a configuration file from disk and the startup checks
//! that must halt the bot instead of running degraded:
//! - Missing default messages
//! - Empty or duplicated command tables
//! - Out-of-range numeric settings

use std::io::Write;

use chatbridge_core::config::message_keys;
use chatbridge_core::{BridgeConfig, CommandRegistry, Error, Language};

const CONFIG: &str = r#"
MqttConfig:
  Broker: localhost:1883
  TeleSrcTopic: Telegram/GroupID/Rx
  TeleDstTopic: Telegram/GroupID/Tx
CmdConfig:
  DeviceCmdCodeArrVN:
    - ChatCmd: đèn
      DeviceCmd: LED
      ChatResponseMap:
        "ON": Đèn bật
        "OFF": Đèn tắt
    - ChatCmd: nhiệt độ
      DeviceCmd: TEMP
      ChatResponseMap:
        Data: "Nhiệt độ: "
  DeviceCmdCodeArrEN:
    - ChatCmd: light
      DeviceCmd: LED
      ChatResponseMap:
        "ON": Light on
        "OFF": Light off
    - ChatCmd: temperature
      DeviceCmd: TEMP
      ChatResponseMap:
        Data: "Temperature: "
  DefaultRespMsg:
    ErrorCmd: Error command
    TimeoutVN: Quá thời gian
    TimeoutEN: Timeout
    ResponseHelpVN: Lệnh hỗ trợ
    ResponseHelpEN: Supported commands
    SuggestVN: Gợi ý
    SuggestEN: Suggestions
  TickTimeout: 2
  StringRateThreshold: 75.5
TelegramConfig:
  BotName: bridge_bot
  BotToken: "123:abc"
SerialConfig:
  ComName: /dev/ttyUSB0
  Baudrate: 9600
  SerialDstTopic: LedDevice/Tx
  SerialSrcTopic: LedDevice/Rx
"#;

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    let config = BridgeConfig::load(file.path()).unwrap();
    assert_eq!(config.mqtt_config.host_port().unwrap().1, 1883);

    let telegram = config.telegram().unwrap();
    assert_eq!(telegram.bot_token, "123:abc");
    assert_eq!(telegram.api_url, "https://api.telegram.org");
    assert_eq!(telegram.poll_timeout_secs, 30);

    let serial = config.serial().unwrap();
    assert_eq!(serial.baudrate, 9600);
    assert_eq!(serial.serial_dst_topic, "LedDevice/Tx");
}

#[test]
fn test_load_missing_file_is_io_error() {
    let err = BridgeConfig::load("/definitely/not/here.yaml").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_malformed_yaml_is_yaml_error() {
    let err = BridgeConfig::from_yaml("MqttConfig: [not, a, map]").unwrap_err();
    assert!(matches!(err, Error::Yaml(_)));
}

#[test]
fn test_registry_from_config() {
    let config = BridgeConfig::from_yaml(CONFIG).unwrap();
    let commands = config.commands().unwrap();
    assert_eq!(commands.string_rate_threshold, 75.5);

    let registry = CommandRegistry::from_config(commands).unwrap();
    assert_eq!(
        registry.chat_commands(),
        &["đèn", "light", "nhiệt độ", "temperature"]
    );
    assert_eq!(registry.error_message(), "Error command");

    let temperature = registry.resolve("temperature").unwrap();
    assert_eq!(temperature.language, Language::English);
    assert_eq!(temperature.template("Timeout"), Some("Timeout"));
}

#[test]
fn test_every_required_message_is_enforced() {
    for key in message_keys::REQUIRED {
        let mut commands = BridgeConfig::from_yaml(CONFIG).unwrap().cmd_config.unwrap();
        commands.default_resp_msg.remove(key);

        let err = CommandRegistry::from_config(&commands).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{} should be required", key);
    }
}

#[test]
fn test_numeric_ranges() {
    let base = BridgeConfig::from_yaml(CONFIG).unwrap().cmd_config.unwrap();

    let mut zero_timeout = base.clone();
    zero_timeout.tick_timeout = 0;
    assert!(zero_timeout.validate().is_err());

    let mut above = base.clone();
    above.string_rate_threshold = 100.5;
    assert!(above.validate().is_err());

    let mut full = base;
    full.string_rate_threshold = 100.0;
    assert!(full.validate().is_ok());
}

#[test]
fn test_missing_sections() {
    let config = BridgeConfig::from_yaml("MqttConfig:\n  Broker: localhost\n").unwrap();
    assert!(config.commands().is_err());
    assert!(config.telegram().is_err());
    assert!(config.serial().is_err());
    assert_eq!(config.sensor().command_topic, "TestSensor/Tx");
    assert_eq!(config.mqtt_config.led_device_dst_topic, "LedDevice/Tx");
}

//! ChatBridge command-line interface.
//!
//! Every component runs as its own process connected to the same broker:
//! the bot, the Telegram gateway, the serial bridge and the sensor
//! simulator. `check-config` and `match` work offline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chatbridge_bot::{BotService, Dispatcher};
use chatbridge_core::{BridgeConfig, CommandRegistry, FuzzyMatcher, Language, SharedPublisher};
use chatbridge_devices::{
    serial, BrokerDeviceTransport, DeviceTopics, MqttClient, ResponseCorrelator, SensorSimulator,
    SerialBridge,
};
use chatbridge_messages::{MqttChatSink, TelegramClient, TelegramGateway, TopicPattern};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chatbridge")]
#[command(author, version, about = "Chat to device bridge over MQTT", long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Configuration file.
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the command bot.
    Bot,
    /// Run the Telegram gateway.
    Telegram,
    /// Bridge a serial device to the broker.
    SerialBridge,
    /// Run a simulated sensor node.
    SimulateSensor,
    /// Validate the configuration and list the registered commands.
    CheckConfig,
    /// Score a chat input against the registered commands.
    Match {
        /// Chat input to match.
        #[arg(required = true)]
        text: String,
        /// Number of ranked candidates to show.
        #[arg(short = 'n', long, default_value_t = 5)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Bot => run_bot(&args.config).await,
        Command::Telegram => run_telegram(&args.config).await,
        Command::SerialBridge => run_serial_bridge(&args.config).await,
        Command::SimulateSensor => run_sensor(&args.config).await,
        Command::CheckConfig => check_config(&args.config),
        Command::Match { text, top } => run_match(&args.config, &text, top),
    }
}

fn init_logging(verbose: bool) {
    // Check if JSON logging is requested (for production/container environments)
    let json_logging = std::env::var("CHATBRIDGE_LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("chatbridge={}", default_level))
            .add_directive(tracing::Level::WARN.into())
    });

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: &Path) -> Result<BridgeConfig> {
    BridgeConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn load_registry(config: &BridgeConfig) -> Result<CommandRegistry> {
    let commands = config.commands()?;
    CommandRegistry::from_config(commands).context("Invalid CmdConfig")
}

/// Wait for Ctrl-C while `task` runs.
async fn until_shutdown<F>(task: F) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    tokio::select! {
        result = task => result,
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            tracing::info!("Shutting down");
            Ok(())
        }
    }
}

async fn run_bot(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let commands = config.commands()?;
    let registry = Arc::new(load_registry(&config)?);

    let device_topics = DeviceTopics::from_config(&config.mqtt_config);
    let chat_rx = TopicPattern::from_template(&config.mqtt_config.tele_src_topic)?;
    let subscriptions = BotService::subscriptions(&chat_rx, &device_topics);

    let (client, inbound) = MqttClient::connect(&config.mqtt_config, "bot", subscriptions)
        .await
        .context("Failed to start MQTT client")?;
    let publisher: SharedPublisher = Arc::new(client.clone());

    let transport = Arc::new(BrokerDeviceTransport::new(
        publisher.clone(),
        device_topics.clone(),
    ));
    let correlator = Arc::new(ResponseCorrelator::new(transport, commands.timeout()));
    let chat = Arc::new(MqttChatSink::from_template(
        publisher,
        &config.mqtt_config.tele_dst_topic,
    )?);
    let dispatcher = Arc::new(Dispatcher::new(
        registry,
        FuzzyMatcher::new(f64::from(commands.string_rate_threshold)),
        correlator.clone(),
        chat,
    ));

    let service = BotService::new(dispatcher, correlator, chat_rx, device_topics);
    until_shutdown(async {
        service.run(inbound).await;
        Ok::<(), anyhow::Error>(())
    })
    .await?;

    client.disconnect().await.ok();
    Ok(())
}

async fn run_telegram(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let telegram = config.telegram()?;

    let api = TelegramClient::new(telegram)?;
    let me = api.get_me().await.context("Telegram authorization failed")?;
    tracing::info!(
        "Authorized on account {}",
        me.username.as_deref().unwrap_or(&telegram.bot_name)
    );

    let subscriptions = TelegramGateway::subscriptions(&config.mqtt_config.tele_dst_topic)?;
    let (client, inbound) = MqttClient::connect(&config.mqtt_config, "telegram", subscriptions)
        .await
        .context("Failed to start MQTT client")?;

    let gateway = TelegramGateway::new(
        Arc::new(api),
        Arc::new(client.clone()),
        &config.mqtt_config.tele_src_topic,
        &config.mqtt_config.tele_dst_topic,
        telegram.poll_timeout_secs,
    )?;

    until_shutdown(async { gateway.run(inbound).await.map_err(anyhow::Error::from) }).await?;
    client.disconnect().await.ok();
    Ok(())
}

async fn run_serial_bridge(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let serial_config = config.serial()?;

    let port = serial::open_port(serial_config)
        .with_context(|| format!("Failed to open {}", serial_config.com_name))?;

    let bridge = SerialBridge::from_config(serial_config);
    let (client, inbound) = MqttClient::connect(
        &config.mqtt_config,
        "serial",
        vec![bridge.dst_topic().to_string()],
    )
    .await
    .context("Failed to start MQTT client")?;

    until_shutdown(async {
        bridge
            .run(port, &client, inbound)
            .await
            .map_err(anyhow::Error::from)
    })
    .await?;
    client.disconnect().await.ok();
    Ok(())
}

async fn run_sensor(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let mut simulator = SensorSimulator::new(&config.sensor());

    let (client, inbound) = MqttClient::connect(
        &config.mqtt_config,
        "sensor",
        vec![simulator.command_topic().to_string()],
    )
    .await
    .context("Failed to start MQTT client")?;

    until_shutdown(async {
        simulator
            .run(&client, inbound)
            .await
            .map_err(anyhow::Error::from)
    })
    .await?;
    client.disconnect().await.ok();
    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let registry = load_registry(&config)?;
    config.mqtt_config.host_port()?;
    TopicPattern::from_template(&config.mqtt_config.tele_src_topic)?;
    TopicPattern::from_template(&config.mqtt_config.tele_dst_topic)?;

    println!("Configuration OK: {}", path.display());
    println!("Broker: {}", config.mqtt_config.broker);
    for language in Language::ALL {
        println!("\n[{}]", language);
        for descriptor in registry.table(language) {
            let mut keys: Vec<&str> = descriptor
                .response_templates
                .keys()
                .map(String::as_str)
                .collect();
            keys.sort_unstable();
            println!(
                "  {:<24} -> {:<12} {} ({})",
                descriptor.chat_command,
                descriptor.device_command,
                descriptor.device_kind(),
                keys.join(", ")
            );
        }
    }
    println!("\n{} chat commands registered", registry.len());

    if let Some(telegram) = &config.telegram_config {
        println!("Telegram bot: {}", telegram.bot_name);
    }
    if let Some(serial) = &config.serial_config {
        println!("Serial device: {} @ {}", serial.com_name, serial.baudrate);
    }
    Ok(())
}

fn run_match(path: &Path, text: &str, top: usize) -> Result<()> {
    let config = load_config(path)?;
    let registry = load_registry(&config)?;
    let matcher = FuzzyMatcher::new(f64::from(config.commands()?.string_rate_threshold));

    let result = matcher.match_command(text, registry.chat_commands());
    println!("Input: {}", text);
    println!(
        "Best: {} ({:.2} %) -> {}",
        result.candidate, result.similarity, result.tier
    );
    for candidate in result.top(top) {
        let language = registry
            .language_of(&candidate.command)
            .map(|l| l.code())
            .unwrap_or("--");
        println!(
            "  {:>6.2} %  [{}] {}",
            candidate.similarity, language, candidate.command
        );
    }
    Ok(())
}

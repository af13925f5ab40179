//! Serial line bridge.
//!
//! Forwards broker payloads to a line-oriented device and publishes every
//! line the device writes back. The bridge runs over any
//! `AsyncRead + AsyncWrite`; in production that is the port named by
//! `SerialConfig.ComName`, opened 8N1 at `SerialConfig.Baudrate`.

use chatbridge_core::config::SerialConfig;
use chatbridge_core::{InboundMessage, Publisher};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::error::{Error, Result};

/// Open the configured serial port. Must be called inside a tokio runtime.
pub fn open_port(config: &SerialConfig) -> Result<SerialStream> {
    let port = tokio_serial::new(config.com_name.as_str(), config.baudrate).open_native_async()?;
    tracing::info!(
        "Opened serial device {} at {} baud",
        config.com_name,
        config.baudrate
    );
    Ok(port)
}

/// Topic pair served by the bridge.
#[derive(Debug, Clone)]
pub struct SerialBridge {
    /// Payloads on this topic are written to the port.
    dst_topic: String,
    /// Lines read from the port are published here.
    src_topic: String,
}

impl SerialBridge {
    pub fn new(dst_topic: impl Into<String>, src_topic: impl Into<String>) -> Self {
        Self {
            dst_topic: dst_topic.into(),
            src_topic: src_topic.into(),
        }
    }

    pub fn from_config(config: &SerialConfig) -> Self {
        Self::new(&config.serial_dst_topic, &config.serial_src_topic)
    }

    pub fn dst_topic(&self) -> &str {
        &self.dst_topic
    }

    /// Run until the port reaches EOF or the inbound stream closes.
    pub async fn run<P>(
        &self,
        port: P,
        publisher: &dyn Publisher,
        mut inbound: mpsc::Receiver<InboundMessage>,
    ) -> Result<()>
    where
        P: AsyncRead + AsyncWrite + Send,
    {
        let (reader, mut writer) = tokio::io::split(port);
        let mut lines = BufReader::new(reader).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => {
                        let line = line.trim_end_matches('\r');
                        if line.is_empty() {
                            continue;
                        }
                        tracing::info!("Publish: {}: {}", self.src_topic, line);
                        publisher
                            .publish(&self.src_topic, line)
                            .await
                            .map_err(|e| Error::Transport(e.to_string()))?;
                    }
                    None => {
                        tracing::info!("Serial device closed");
                        return Ok(());
                    }
                },
                message = inbound.recv() => match message {
                    Some(message) if message.topic == self.dst_topic => {
                        writer.write_all(message.payload.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                        writer.flush().await?;
                        tracing::info!("Sent [{}] to serial device", message.payload);
                    }
                    Some(message) => {
                        tracing::debug!("Ignoring message on {}", message.topic);
                    }
                    None => return Ok(()),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::io::AsyncReadExt;

    #[derive(Default)]
    struct RecordingPublisher {
        sent: parking_lot::Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish(&self, topic: &str, payload: &str) -> chatbridge_core::Result<()> {
            self.sent.lock().push((topic.to_string(), payload.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_bridge_forwards_both_directions() {
        let (port, mut device) = tokio::io::duplex(256);
        let (tx, rx) = mpsc::channel(4);
        let publisher = RecordingPublisher::default();
        let bridge = SerialBridge::new("Led/Tx", "Led/Rx");

        let device_side = async {
            tx.send(InboundMessage::new("Led/Tx", "LED_ON")).await.unwrap();
            tx.send(InboundMessage::new("Other/Tx", "IGNORED")).await.unwrap();

            let mut buf = [0u8; 7];
            device.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"LED_ON\n");

            device.write_all(b"ON\r\n\n").await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            drop(device);
        };

        let (result, ()) = tokio::join!(bridge.run(port, &publisher, rx), device_side);
        result.unwrap();

        assert_eq!(
            publisher.sent.lock().as_slice(),
            &[("Led/Rx".to_string(), "ON".to_string())]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_reaches_silent_device() {
        // Pseudo terminal pair: the bridge owns the slave side.
        let (device, port) = SerialStream::pair().unwrap();
        let (tx, rx) = mpsc::channel(4);
        let publisher = RecordingPublisher::default();
        let bridge = SerialBridge::new("Led/Tx", "Led/Rx");

        let device_side = async {
            let (reader, mut writer) = tokio::io::split(device);
            let mut lines = BufReader::new(reader).lines();

            // Nothing is pending on the port when the command arrives.
            tx.send(InboundMessage::new("Led/Tx", "LED_ON")).await.unwrap();
            let line = tokio::time::timeout(Duration::from_secs(3), lines.next_line())
                .await
                .expect("command never reached the device")
                .unwrap()
                .unwrap();
            assert_eq!(line.trim_end_matches('\r'), "LED_ON");

            writer.write_all(b"ON\n").await.unwrap();
            let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
            while publisher.sent.lock().is_empty() && tokio::time::Instant::now() < deadline {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            drop(tx);
        };

        let (result, ()) = tokio::join!(bridge.run(port, &publisher, rx), device_side);
        result.unwrap();

        assert_eq!(
            publisher.sent.lock().as_slice(),
            &[("Led/Rx".to_string(), "ON".to_string())]
        );
    }
}

//! Concurrency tests for the response correlator.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chatbridge_core::{CommandRegistry, CommandSource, DeviceKind, Language, ResponseKey};
use chatbridge_devices::{DeviceTransport, ResponseCorrelator, Result};
use tokio::time::Instant;

/// Answers each command with its own payload after a delay.
struct EchoDevice {
    correlator: parking_lot::Mutex<Weak<ResponseCorrelator>>,
    delay: Duration,
    sent: parking_lot::Mutex<Vec<String>>,
}

#[async_trait]
impl DeviceTransport for EchoDevice {
    async fn send(&self, kind: DeviceKind, payload: &str) -> Result<()> {
        self.sent.lock().push(payload.to_string());
        let correlator = self.correlator.lock().upgrade();
        if let Some(correlator) = correlator {
            let delay = self.delay;
            let reply = payload.to_string();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                correlator.deposit(kind, reply);
            });
        }
        Ok(())
    }
}

fn setup(delay: Duration) -> (Arc<ResponseCorrelator>, Arc<EchoDevice>, CommandRegistry) {
    let device = Arc::new(EchoDevice {
        correlator: parking_lot::Mutex::new(Weak::new()),
        delay,
        sent: parking_lot::Mutex::new(Vec::new()),
    });
    let correlator = Arc::new(ResponseCorrelator::new(device.clone(), Duration::from_secs(5)));
    *device.correlator.lock() = Arc::downgrade(&correlator);

    let messages = [("TimeoutEN".to_string(), "Timed out".to_string())].into();
    let mut builder = CommandRegistry::builder(messages);
    builder
        .register(
            Language::English,
            &[
                CommandSource::new("on", "ON").with_response("ON", "Light on"),
                CommandSource::new("off", "OFF").with_response("OFF", "Light off"),
                CommandSource::new("humidity", "HUMP").with_response("Data", "Humidity: "),
            ],
        )
        .unwrap();

    (correlator, device, builder.build())
}

#[tokio::test(start_paused = true)]
async fn test_same_device_requests_are_serialized() {
    let (correlator, device, registry) = setup(Duration::from_millis(100));
    let on = registry.resolve("on").unwrap();
    let off = registry.resolve("off").unwrap();

    let started = Instant::now();
    let (first, second) = tokio::join!(correlator.invoke(on), correlator.invoke(off));

    // Each caller gets the reply to its own command.
    assert_eq!(first.unwrap(), ResponseKey::Device("ON".to_string()));
    assert_eq!(second.unwrap(), ResponseKey::Device("OFF".to_string()));
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(device.sent.lock().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_different_devices_run_concurrently() {
    let (correlator, _, registry) = setup(Duration::from_millis(100));
    let on = registry.resolve("on").unwrap();
    let humidity = registry.resolve("humidity").unwrap();

    let started = Instant::now();
    let (led, sensor) = tokio::join!(correlator.invoke(on), correlator.invoke(humidity));

    assert_eq!(led.unwrap(), ResponseKey::Device("ON".to_string()));
    assert_eq!(sensor.unwrap(), ResponseKey::Data("HUMP".to_string()));
    assert!(started.elapsed() < Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_late_reply_does_not_leak_into_next_request() {
    // Replies arrive after the deadline.
    let (correlator, _, registry) = setup(Duration::from_secs(6));
    let on = registry.resolve("on").unwrap();

    assert_eq!(correlator.invoke(on).await.unwrap(), ResponseKey::Timeout);

    // Let the late "ON" land in the slot.
    tokio::time::sleep(Duration::from_secs(2)).await;

    let off = registry.resolve("off").unwrap();
    let started = Instant::now();
    let key = correlator.invoke(off).await.unwrap();

    assert_eq!(key, ResponseKey::Timeout);
    assert!(started.elapsed() >= correlator.timeout());
}

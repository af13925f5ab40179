//! Single-slot request/reply rendezvous per device.
//!
//! Device replies carry no request id, so a reply is paired with whichever
//! request is outstanding on the same device. [`DeviceChannel`] makes that
//! safe: the reply slot holds at most one value, and the reader side sits
//! behind an async mutex so only one request per device can be in flight.
//!
//! ```text
//! reply listener ──deposit()──▶ [ slot (1) ] ──wait()──▶ correlator
//!                                             ▲
//!                              lock() held across send + wait
//! ```

use std::time::Duration;

use chatbridge_core::DeviceKind;
use tokio::sync::{mpsc, Mutex, MutexGuard};

/// Reply slot for one device.
#[derive(Debug)]
pub struct DeviceChannel {
    kind: DeviceKind,
    tx: mpsc::Sender<String>,
    rx: Mutex<mpsc::Receiver<String>>,
}

impl DeviceChannel {
    pub fn new(kind: DeviceKind) -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            kind,
            tx,
            rx: Mutex::new(rx),
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Hand a device reply to the waiting request.
    ///
    /// Never blocks. Returns `false` and drops the reply when the slot is
    /// still occupied by an undrained reply.
    pub fn deposit(&self, reply: impl Into<String>) -> bool {
        match self.tx.try_send(reply.into()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(reply)) => {
                tracing::warn!(
                    "Dropping {} reply '{}': previous reply not yet consumed",
                    self.kind,
                    reply
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Take exclusive use of the device for one request.
    pub async fn lock(&self) -> PendingRequest<'_> {
        PendingRequest {
            kind: self.kind,
            rx: self.rx.lock().await,
        }
    }
}

/// Exclusive hold on a device channel for the duration of one request.
#[derive(Debug)]
pub struct PendingRequest<'a> {
    kind: DeviceKind,
    rx: MutexGuard<'a, mpsc::Receiver<String>>,
}

impl PendingRequest<'_> {
    /// Drop a reply that arrived after an earlier request gave up waiting.
    pub fn discard_stale(&mut self) -> Option<String> {
        let stale = self.rx.try_recv().ok();
        if let Some(reply) = &stale {
            tracing::warn!("Discarding late {} reply '{}'", self.kind, reply);
        }
        stale
    }

    /// Wait up to `timeout` for the reply. `None` means the deadline passed.
    pub async fn wait(&mut self, timeout: Duration) -> Option<String> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(reply) => reply,
            Err(_) => None,
        }
    }
}

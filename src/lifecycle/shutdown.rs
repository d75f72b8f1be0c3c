//! Shutdown coordination.
//!
//! One `Shutdown` handle is created at startup; the signal listener and
//! tests trigger it, and the HTTP server subscribes to learn when to stop
//! accepting and start its drain deadline.

use std::fmt;

use tokio::sync::broadcast;

/// Why the proxy is draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// Triggered from code.
    Requested,
}

impl ShutdownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::Interrupt => "SIGINT",
            ShutdownReason::Terminate => "SIGTERM",
            ShutdownReason::Requested => "requested",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broadcasts the first shutdown reason to every subscriber.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<ShutdownReason>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownReason> {
        self.tx.subscribe()
    }

    /// Start draining from code.
    pub fn trigger(&self) {
        self.trigger_with(ShutdownReason::Requested);
    }

    /// Start draining for `reason`.
    pub fn trigger_with(&self, reason: ShutdownReason) {
        tracing::info!(reason = %reason, subscribers = self.tx.receiver_count(), "Shutdown triggered");
        let _ = self.tx.send(reason);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for a shutdown reason; a dropped coordinator counts as a request.
pub async fn wait_for(receiver: &mut broadcast::Receiver<ShutdownReason>) -> ShutdownReason {
    match receiver.recv().await {
        Ok(reason) => reason,
        Err(broadcast::error::RecvError::Lagged(_)) | Err(broadcast::error::RecvError::Closed) => {
            ShutdownReason::Requested
        }
    }
}

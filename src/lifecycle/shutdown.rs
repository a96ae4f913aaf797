//! Gateway shutdown fan-out.

use std::future::Future;
use tokio::sync::broadcast;

/// Broadcasts a single stop signal to the server and its background tasks.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify every current subscriber. Later subscribers never see it.
    pub fn trigger(&self) {
        let notified = self.tx.send(()).unwrap_or(0);
        tracing::debug!(notified, "Shutdown triggered");
    }

    /// Wait for `signal`, then trigger.
    pub async fn trigger_on(&self, signal: impl Future<Output = ()>) {
        signal.await;
        tracing::info!("Stopping gateway, draining connections");
        self.trigger();
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

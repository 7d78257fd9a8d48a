//! Shutdown coordination for the host.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// The accept loop and every connection task subscribe; triggering stops
/// new accepts while in-flight transactions finish.
#[derive(Debug, Clone)]
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

    pub fn trigger(&self) {
        tracing::info!(subscribers = self.tx.receiver_count(), "Shutdown triggered");
        let _ = self.tx.send(());
    }

    /// Trigger once Ctrl-C is received.
    pub async fn trigger_on_ctrl_c(self) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => self.trigger(),
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_all_subscribers() {
        let shutdown = Shutdown::new();
        let mut first = shutdown.subscribe();
        let mut second = shutdown.clone().subscribe();

        shutdown.trigger();

        assert!(first.recv().await.is_ok());
        assert!(second.recv().await.is_ok());
    }
}

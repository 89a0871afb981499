//! Shutdown coordination.

use std::future::Future;
use tokio::sync::broadcast;

/// Broadcasts a single shutdown event to the HTTP server and any
/// background task.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A future resolving once shutdown is triggered. Subscribes immediately,
    /// so a trigger after this call is never missed.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    }

    /// Trigger shutdown. Listeners subscribed later are not woken.
    pub fn trigger(&self) {
        tracing::info!(listeners = self.tx.receiver_count(), "Shutting down");
        let _ = self.tx.send(());
    }

    /// Trigger once an OS signal arrives.
    pub async fn trigger_on_signal(&self) {
        crate::lifecycle::signals::shutdown_signal().await;
        self.trigger();
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
    use std::time::Duration;

    #[tokio::test]
    async fn test_listeners_resolve_on_trigger() {
        let shutdown = Shutdown::new();
        let a = shutdown.signalled();
        let b = shutdown.signalled();

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), async {
            a.await;
            b.await;
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_trigger_twice_still_resolves() {
        let shutdown = Shutdown::default();
        let listener = shutdown.signalled();

        shutdown.trigger();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), listener).await.unwrap();
    }

    #[tokio::test]
    async fn test_pending_without_trigger() {
        let shutdown = Shutdown::new();
        let listener = shutdown.signalled();
        assert!(tokio::time::timeout(Duration::from_millis(50), listener).await.is_err());
    }
}

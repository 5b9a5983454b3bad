use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::mpsc;

/// A consumer of raw byte payloads published on a bus address.
///
/// Handlers receive every payload published on their address exactly once,
/// in publish order. A handler that cannot use a payload (for instance
/// because it fails to decode) reports the problem itself; nothing is
/// propagated back to the publisher.
#[async_trait]
pub trait Subscriber: Send + Sync + 'static {
    async fn on_message(&self, payload: Bytes);
}

/// Decouples producers from consumers through named logical addresses.
///
/// Every subscriber owns an unbounded queue drained by its own task, so
/// `publish` never waits on consumer processing and a slow or failing
/// consumer cannot disturb delivery to the others.
pub struct MessageBus {
    subscribers: DashMap<String, Vec<mpsc::UnboundedSender<Bytes>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    /// Delivers `payload` to every subscriber currently registered on
    /// `address`. Fire-and-forget: no per-consumer result is reported and
    /// a missing subscriber is not an error.
    pub fn publish(&self, address: &str, payload: Bytes) {
        let Some(senders) = self.subscribers.get(address) else {
            tracing::trace!(address, "no subscribers for published payload");
            return;
        };
        for sender in senders.iter() {
            // A send only fails once the consumer task is gone; the
            // payload is simply dropped then.
            let _ = sender.send(payload.clone());
        }
    }

    /// Registers `subscriber` on `address` and spawns the task that feeds
    /// it. Payloads published from this point on are delivered in order.
    pub fn subscribe(&self, address: &str, subscriber: Arc<dyn Subscriber>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Bytes>();
        self.subscribers
            .entry(address.to_string())
            .or_default()
            .push(sender);

        let address = address.to_string();
        tokio::spawn(async move {
            while let Some(payload) = receiver.recv().await {
                subscriber.on_message(payload).await;
            }
            tracing::debug!(address, "subscriber drained, stopping");
        });
    }

    /// Number of subscribers currently registered on `address`.
    pub fn subscriber_count(&self, address: &str) -> usize {
        self.subscribers
            .get(address)
            .map(|senders| senders.len())
            .unwrap_or(0)
    }

    /// Stops delivery by dropping all producer-side queue handles.
    /// Payloads already queued still drain to their consumers; nothing is
    /// rolled back.
    pub fn close(&self) {
        self.subscribers.clear();
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

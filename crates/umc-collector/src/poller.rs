use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use umc_bus::{MessageBus, PERSIST_ADDR};
use umc_measure::{BinaryCodec, Encoder, Measurement};

use crate::error::CollectError;

/// A metrics source that can be polled for a batch of measurements.
#[async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Short identifier used in log output.
    fn name(&self) -> &str;

    async fn collect(&self) -> Result<Vec<Measurement>, CollectError>;
}

/// Periodically polls one collector and publishes each successful batch,
/// wire-encoded, on the persistence address.
///
/// At most one collect per target is in flight: a tick that arrives while
/// the previous collect is still running is skipped, not queued.
pub struct Poller {
    collector: Arc<dyn Collector>,
    bus: Arc<MessageBus>,
    interval: Duration,
}

/// Controls a spawned [`Poller`].
pub struct PollerHandle {
    active: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl Poller {
    pub fn new(collector: Arc<dyn Collector>, bus: Arc<MessageBus>, interval: Duration) -> Self {
        Self {
            collector,
            bus,
            interval,
        }
    }

    /// Starts the timer loop. The first poll fires one full interval after
    /// spawning.
    pub fn spawn(self) -> PollerHandle {
        let active = Arc::new(AtomicBool::new(true));
        let busy = Arc::new(AtomicBool::new(false));
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let loop_active = active.clone();
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + self.interval;
            let mut ticker = tokio::time::interval_at(start, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(
                collector = self.collector.name(),
                interval_ms = self.interval.as_millis() as u64,
                "poller started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown_rx.changed() => break,
                }

                if busy.swap(true, Ordering::AcqRel) {
                    tracing::debug!(
                        collector = self.collector.name(),
                        "previous poll still in flight, skipping tick"
                    );
                    continue;
                }

                let collector = self.collector.clone();
                let bus = self.bus.clone();
                let busy = busy.clone();
                let active = loop_active.clone();
                tokio::spawn(async move {
                    match collector.collect().await {
                        Ok(batch) if batch.is_empty() => {}
                        // Completion of an in-flight poll after shutdown
                        // must not publish.
                        Ok(batch) => {
                            if active.load(Ordering::Acquire) {
                                bus.publish(PERSIST_ADDR, BinaryCodec.encode(&batch));
                                tracing::debug!(
                                    collector = collector.name(),
                                    count = batch.len(),
                                    "published measurement batch"
                                );
                            }
                        }
                        Err(e) => {
                            tracing::error!(
                                collector = collector.name(),
                                error = %e,
                                "error fetching metrics"
                            );
                        }
                    }
                    busy.store(false, Ordering::Release);
                });
            }

            tracing::info!(collector = self.collector.name(), "poller stopped");
        });

        PollerHandle {
            active,
            shutdown,
            task,
        }
    }
}

impl PollerHandle {
    /// Stops the timer loop and waits for it to exit. An in-flight collect
    /// is left to finish but its result is discarded.
    pub async fn stop(self) {
        self.active.store(false, Ordering::Release);
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;
    use umc_bus::Subscriber;

    struct CountingSubscriber {
        payloads: Mutex<Vec<Bytes>>,
    }

    #[async_trait]
    impl Subscriber for CountingSubscriber {
        async fn on_message(&self, payload: Bytes) {
            self.payloads.lock().push(payload);
        }
    }

    struct FakeCollector {
        invocations: AtomicUsize,
        delay: Duration,
        batch: Vec<Measurement>,
    }

    impl FakeCollector {
        fn new(delay: Duration, batch: Vec<Measurement>) -> Arc<Self> {
            Arc::new(Self {
                invocations: AtomicUsize::new(0),
                delay,
                batch,
            })
        }

        fn invocations(&self) -> usize {
            self.invocations.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl Collector for FakeCollector {
        fn name(&self) -> &str {
            "fake"
        }

        async fn collect(&self) -> Result<Vec<Measurement>, CollectError> {
            self.invocations.fetch_add(1, Ordering::Relaxed);
            tokio::time::sleep(self.delay).await;
            Ok(self.batch.clone())
        }
    }

    fn sample_batch() -> Vec<Measurement> {
        vec![Measurement::builder()
            .name("m")
            .timestamp(1)
            .value("v", 1i32)
            .build()
            .unwrap()]
    }

    #[tokio::test]
    async fn test_polls_and_publishes_on_interval() {
        let bus = Arc::new(MessageBus::new());
        let sub = Arc::new(CountingSubscriber {
            payloads: Mutex::new(Vec::new()),
        });
        bus.subscribe(PERSIST_ADDR, sub.clone());

        let collector = FakeCollector::new(Duration::from_millis(1), sample_batch());
        let handle = Poller::new(
            collector.clone(),
            bus.clone(),
            Duration::from_millis(50),
        )
        .spawn();

        tokio::time::sleep(Duration::from_millis(180)).await;
        handle.stop().await;

        let invocations = collector.invocations();
        assert!(invocations >= 1, "expected at least one poll");
        assert!(invocations <= 5, "polled too often: {invocations}");

        // A collect still in flight at stop time may legitimately skip its
        // publish, so allow one less than the number of polls.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let published = sub.payloads.lock().len();
        assert!(published >= invocations.saturating_sub(1));
        assert!(published <= invocations);
    }

    #[tokio::test]
    async fn test_slow_poll_skips_ticks() {
        let bus = Arc::new(MessageBus::new());
        let collector = FakeCollector::new(Duration::from_secs(1), sample_batch());
        let handle = Poller::new(
            collector.clone(),
            bus.clone(),
            Duration::from_millis(40),
        )
        .spawn();

        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.stop().await;

        // Many ticks elapsed, but the first collect was still running.
        assert_eq!(collector.invocations(), 1);
    }

    #[tokio::test]
    async fn test_nothing_published_after_stop() {
        let bus = Arc::new(MessageBus::new());
        let sub = Arc::new(CountingSubscriber {
            payloads: Mutex::new(Vec::new()),
        });
        bus.subscribe(PERSIST_ADDR, sub.clone());

        let collector = FakeCollector::new(Duration::from_millis(300), sample_batch());
        let handle = Poller::new(
            collector.clone(),
            bus.clone(),
            Duration::from_millis(40),
        )
        .spawn();

        // Let exactly one collect start, then stop before it completes.
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop().await;
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(collector.invocations(), 1);
        assert!(sub.payloads.lock().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_published() {
        let bus = Arc::new(MessageBus::new());
        let sub = Arc::new(CountingSubscriber {
            payloads: Mutex::new(Vec::new()),
        });
        bus.subscribe(PERSIST_ADDR, sub.clone());

        let collector = FakeCollector::new(Duration::from_millis(1), Vec::new());
        let handle = Poller::new(
            collector.clone(),
            bus.clone(),
            Duration::from_millis(40),
        )
        .spawn();

        tokio::time::sleep(Duration::from_millis(130)).await;
        handle.stop().await;

        assert!(collector.invocations() >= 1);
        assert!(sub.payloads.lock().is_empty());
    }
}

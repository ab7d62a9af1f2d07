//! Non-blocking broker sink backed by a delivery task.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use vehicle_domain::{ObserverError, VehicleObserver, VehicleSnapshot, VehicleUpdate};

use super::producer::{BrokerMessage, MessageProducer};
use crate::error::{PublishError, Result};

/// Delivery outcome reported when the sink closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: u64,
    pub failed: u64,
}

/// Publishes one message per update, keyed by vehicle id.
///
/// `notify` only enqueues; a background task owns the producer and delivers
/// in enqueue order. Delivery failures are logged and counted, never surfaced
/// to the simulation. Dropping the sink ends the queue.
#[derive(Debug)]
pub struct BrokerSink {
    topic: String,
    tx: Option<mpsc::UnboundedSender<BrokerMessage>>,
}

/// Background delivery task of a [`BrokerSink`].
#[derive(Debug)]
pub struct DeliveryTask {
    topic: String,
    worker: JoinHandle<DeliveryStats>,
}

impl BrokerSink {
    /// Start the delivery task. Must be called from within a tokio runtime.
    pub fn spawn<P: MessageProducer + 'static>(
        producer: P,
        topic: impl Into<String>,
    ) -> (Self, DeliveryTask) {
        let topic = topic.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(deliver(producer, rx));

        info!(topic = %topic, "Broker sink initialized");
        let task = DeliveryTask {
            topic: topic.clone(),
            worker,
        };
        (Self { topic, tx: Some(tx) }, task)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Stop accepting updates. Later notifications fail with `Closed`.
    pub fn close(&mut self) {
        self.tx = None;
    }
}

impl DeliveryTask {
    /// Wait until every sender is gone, the queue is drained and the
    /// producer flushed.
    pub async fn join(self) -> Result<DeliveryStats> {
        let stats = self
            .worker
            .await
            .map_err(|e| PublishError::Worker(e.to_string()))?;

        info!(
            topic = %self.topic,
            delivered = stats.delivered,
            failed = stats.failed,
            "Broker delivery finished"
        );
        Ok(stats)
    }
}

impl VehicleObserver for BrokerSink {
    fn name(&self) -> &str {
        "broker"
    }

    fn notify(&mut self, snapshot: &VehicleSnapshot) -> vehicle_domain::Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| ObserverError::Closed(self.topic.clone()))?;

        let message = BrokerMessage::from_update(&self.topic, &VehicleUpdate::now(snapshot))?;
        tx.send(message)
            .map_err(|_| ObserverError::Closed(format!("{}: delivery task stopped", self.topic)))
    }
}

async fn deliver<P: MessageProducer>(
    mut producer: P,
    mut rx: mpsc::UnboundedReceiver<BrokerMessage>,
) -> DeliveryStats {
    let mut stats = DeliveryStats::default();

    while let Some(message) = rx.recv().await {
        match producer.send(&message).await {
            Ok(()) => stats.delivered += 1,
            Err(e) => {
                stats.failed += 1;
                warn!(topic = %message.topic, key = %message.key, error = %e, "Failed to produce message");
            }
        }
    }

    if let Err(e) = producer.flush().await {
        warn!(error = %e, "Failed to flush producer");
    }
    stats
}

//! Broker message and the producer abstraction behind the broker sink.

use async_trait::async_trait;
use vehicle_domain::VehicleUpdate;

use crate::error::Result;

/// One keyed message bound for a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    pub topic: String,
    /// Vehicle id, so all updates of a vehicle share a key
    pub key: String,
    /// JSON payload
    pub value: String,
}

impl BrokerMessage {
    pub fn from_update(topic: &str, update: &VehicleUpdate) -> Result<Self> {
        Ok(Self {
            topic: topic.to_string(),
            key: update.id.clone(),
            value: serde_json::to_string(update)?,
        })
    }
}

/// Delivers messages to a broker. Placement and partitioning are left to the
/// broker itself.
#[async_trait]
pub trait MessageProducer: Send {
    async fn send(&mut self, message: &BrokerMessage) -> Result<()>;

    /// Wait for anything buffered to reach the broker.
    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

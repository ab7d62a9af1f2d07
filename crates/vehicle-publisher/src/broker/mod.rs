//! # Broker Module
//!
//! Keyed delivery of updates to a message broker. The sink never blocks the
//! simulation; a delivery task owns the producer.

pub mod producer;
#[cfg(feature = "redis")]
pub mod redis_stream;
pub mod sink;

pub use producer::{BrokerMessage, MessageProducer};
#[cfg(feature = "redis")]
pub use redis_stream::RedisStreamProducer;
pub use sink::{BrokerSink, DeliveryStats, DeliveryTask};

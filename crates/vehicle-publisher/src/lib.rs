//! # Vehicle Publisher Library
//!
//! Observers that turn per-tick vehicle snapshots into published updates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Simulation                            │
//! │          (one snapshot per vehicle per tick)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  VehicleObserver sinks                       │
//! │     FileSink   ConsoleSink   MemorySink   BrokerSink         │
//! └─────────────────────────────────────────────────────────────┘
//!                                                  │
//!                                                  ▼ (channel)
//!                                   ┌──────────────────────────────┐
//!                                   │  delivery task               │
//!                                   │  MessageProducer (Redis XADD)│
//!                                   └──────────────────────────────┘
//! ```
//!
//! Every sink emits the same payload: `{id, timestamp, position, heading, speed}`.
//!
//! ## Features
//!
//! - `redis`: Enable the Redis Streams producer (default)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vehicle_publisher::{BrokerSink, FileSink, RedisStreamProducer};
//!
//! let file = FileSink::create("vehicle_positions.json")?;
//! let producer = RedisStreamProducer::connect("redis://127.0.0.1:6379").await?;
//! let (broker, delivery) = BrokerSink::spawn(producer, "vehicle-positions");
//!
//! simulation.register_observer(file);
//! simulation.register_observer(broker);
//! // ... run ...
//! drop(simulation);
//! let stats = delivery.join().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod broker;
pub mod config;
pub mod error;
pub mod sink;

// Re-export commonly used types
#[cfg(feature = "redis")]
pub use broker::RedisStreamProducer;
pub use broker::{BrokerMessage, BrokerSink, DeliveryStats, DeliveryTask, MessageProducer};
pub use config::{BrokerConfig, FileSinkConfig, PublisherConfig};
pub use error::{PublishError, Result};
pub use sink::{ConsoleSink, FileSink, MemoryHandle, MemorySink};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

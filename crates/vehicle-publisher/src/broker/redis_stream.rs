//! Redis Streams producer.
//!
//! Each message becomes one stream entry on the topic key with `key` and
//! `value` fields.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::StreamMaxlen;
use redis::{AsyncCommands, Client};
use tracing::info;

use super::producer::{BrokerMessage, MessageProducer};
use crate::error::Result;

/// Appends messages to a Redis stream with `XADD`.
#[derive(Clone)]
pub struct RedisStreamProducer {
    conn: ConnectionManager,
    max_len: Option<usize>,
}

impl RedisStreamProducer {
    /// Open a managed connection to the broker.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        info!(url = %url, "Connected to Redis broker");
        Ok(Self { conn, max_len: None })
    }

    /// Trim streams to roughly this many entries on every append.
    #[must_use]
    pub const fn with_max_len(mut self, max_len: Option<usize>) -> Self {
        self.max_len = max_len;
        self
    }
}

#[async_trait]
impl MessageProducer for RedisStreamProducer {
    async fn send(&mut self, message: &BrokerMessage) -> Result<()> {
        let fields = [("key", message.key.as_str()), ("value", message.value.as_str())];

        let _: String = match self.max_len {
            Some(len) => {
                self.conn
                    .xadd_maxlen(&message.topic, StreamMaxlen::Approx(len), "*", &fields)
                    .await?
            }
            None => self.conn.xadd(&message.topic, "*", &fields).await?,
        };
        Ok(())
    }
}

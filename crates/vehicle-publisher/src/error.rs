//! Publisher error types

use thiserror::Error;
use vehicle_domain::ObserverError;

/// Sink construction and delivery errors
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Sink already closed: {0}")]
    Closed(String),

    #[error("Delivery worker failed: {0}")]
    Worker(String),
}

impl From<serde_json::Error> for PublishError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for PublishError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for PublishError {
    fn from(err: redis::RedisError) -> Self {
        Self::Redis(err.to_string())
    }
}

impl From<PublishError> for ObserverError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::Io(msg) => Self::Io(msg),
            PublishError::Serialization(msg) => Self::Serialization(msg),
            PublishError::Closed(msg) => Self::Closed(msg),
            PublishError::Redis(msg) | PublishError::Worker(msg) => Self::Delivery(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, PublishError>;

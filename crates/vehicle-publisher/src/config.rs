//! # Publisher Configuration
//!
//! Environment-based defaults for the sinks. Command-line flags take
//! precedence and are applied by the binary.

use std::env;
use std::path::PathBuf;

/// Sink configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherConfig {
    /// JSON array file sink
    pub file: FileSinkConfig,

    /// Message-broker sink
    pub broker: BrokerConfig,
}

/// File sink configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSinkConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

/// Message-broker configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub enabled: bool,
    pub url: String,
    pub topic: String,
    /// Approximate cap on stream length, unbounded when `None`
    pub max_len: Option<usize>,
}

impl PublisherConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            file: FileSinkConfig {
                enabled: lookup("VEHICLE_SIM_FILE_ENABLED")
                    .map_or(true, |v| parse_flag(&v)),
                path: lookup("VEHICLE_SIM_OUTPUT_FILE")
                    .unwrap_or_else(|| "vehicle_positions.json".to_string())
                    .into(),
            },

            broker: BrokerConfig {
                enabled: lookup("VEHICLE_SIM_BROKER_ENABLED")
                    .is_some_and(|v| parse_flag(&v)),
                url: lookup("VEHICLE_SIM_BROKER_URL")
                    .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
                topic: lookup("VEHICLE_SIM_TOPIC")
                    .unwrap_or_else(|| "vehicle-positions".to_string()),
                max_len: lookup("VEHICLE_SIM_STREAM_MAX_LEN").and_then(|v| v.parse().ok()),
            },
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Logging, log shipping and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port to listen on.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level directive (trace, debug, info, warn, error).
    pub log_level: String,

    /// Console log format.
    pub log_format: LogFormat,

    /// Interval between metrics recorder upkeep passes in seconds.
    pub metrics_upkeep_secs: u64,

    /// Remote log aggregator settings.
    pub loki: LokiConfig,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_upkeep_secs: 5,
            loki: LokiConfig::default(),
        }
    }
}

/// Loki push transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LokiConfig {
    /// Ship logs to Loki at all.
    pub enabled: bool,

    /// Base URL of the Loki instance (push path is appended).
    pub url: String,

    /// Interval between batch pushes in seconds.
    pub batch_interval_secs: u64,

    /// Flush early once this many records are buffered.
    pub max_batch_size: usize,

    /// Capacity of the in-process record queue. Records are dropped when full.
    pub queue_capacity: usize,

    /// Per-push HTTP timeout in seconds.
    pub request_timeout_secs: u64,

    /// Retries for a failed push before the batch is dropped.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub retry_max_delay_ms: u64,
}

impl LokiConfig {
    pub fn batch_interval(&self) -> Duration {
        Duration::from_secs(self.batch_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for LokiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://loki:3100".to_string(),
            batch_interval_secs: 5,
            max_batch_size: 1000,
            queue_capacity: 10_000,
            request_timeout_secs: 5,
            max_retries: 3,
            retry_base_delay_ms: 200,
            retry_max_delay_ms: 2000,
        }
    }
}

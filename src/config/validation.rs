//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.host must not be empty")]
    EmptyHost,

    #[error("observability.loki.url is invalid: {0}")]
    InvalidLokiUrl(String),

    #[error("observability.loki.{0} must be greater than zero")]
    Zero(&'static str),

    #[error("observability.metrics_upkeep_secs must be greater than zero")]
    ZeroUpkeepInterval,

    #[error("observability.loki.retry_base_delay_ms ({base}) exceeds retry_max_delay_ms ({max})")]
    RetryDelayOrder { base: u64, max: u64 },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    if config.observability.metrics_upkeep_secs == 0 {
        errors.push(ValidationError::ZeroUpkeepInterval);
    }

    let loki = &config.observability.loki;
    if loki.enabled {
        match Url::parse(&loki.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::InvalidLokiUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            ))),
            Err(e) => errors.push(ValidationError::InvalidLokiUrl(e.to_string())),
        }
    }
    if loki.batch_interval_secs == 0 {
        errors.push(ValidationError::Zero("batch_interval_secs"));
    }
    if loki.max_batch_size == 0 {
        errors.push(ValidationError::Zero("max_batch_size"));
    }
    if loki.queue_capacity == 0 {
        errors.push(ValidationError::Zero("queue_capacity"));
    }
    if loki.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("request_timeout_secs"));
    }
    if loki.retry_base_delay_ms > loki.retry_max_delay_ms {
        errors.push(ValidationError::RetryDelayOrder {
            base: loki.retry_base_delay_ms,
            max: loki.retry_max_delay_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

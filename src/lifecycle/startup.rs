//! Startup orchestration for telemetry.
//!
//! # Responsibilities
//! - Install the tracing subscriber (console + Loki layer)
//! - Spawn the log shipper and the metrics upkeep task
//! - On shutdown, stop both and give the shipper time to flush
//!
//! # Design Decisions
//! - Fail fast: a shipper that cannot be built is a startup error
//! - Draining is bounded by a deadline so a dead aggregator cannot hang exit

use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::ObservabilityConfig;
use crate::lifecycle::Shutdown;
use crate::observability::{init_logging, log_channel, LokiShipper, Metrics, PushError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build log shipper: {0}")]
    Shipper(#[from] PushError),
}

/// Running telemetry: metrics registry plus background tasks.
pub struct Telemetry {
    metrics: Metrics,
    shutdown: Shutdown,
    shipper: Option<JoinHandle<()>>,
    upkeep: JoinHandle<()>,
}

impl Telemetry {
    /// Initialize logging and metrics. Must be called inside a Tokio runtime, once.
    pub fn start(config: &ObservabilityConfig) -> Result<Self, StartupError> {
        let shutdown = Shutdown::new();

        let (sink, shipper) = if config.loki.enabled {
            let (sink, queue) = log_channel(config.loki.queue_capacity);
            let shipper = LokiShipper::new(config.loki.clone(), queue)?;
            (Some(sink), Some(shipper))
        } else {
            (None, None)
        };

        init_logging(config, sink);

        let shipper = shipper.map(|s| s.spawn(shutdown.subscribe()));
        if shipper.is_none() {
            tracing::info!("Loki log shipping disabled");
        }

        let metrics = Metrics::new();
        let upkeep = metrics.spawn_upkeep(
            Duration::from_secs(config.metrics_upkeep_secs),
            shutdown.subscribe(),
        );

        Ok(Self {
            metrics,
            shutdown,
            shipper,
            upkeep,
        })
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Stop background tasks, waiting at most `deadline` for the final log flush.
    pub async fn drain(self, deadline: Duration) {
        self.shutdown.trigger();

        if let Some(shipper) = self.shipper {
            match tokio::time::timeout(deadline, shipper).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "Log shipper task failed"),
                Err(_) => tracing::warn!(deadline = ?deadline, "Log shipper did not drain before deadline"),
            }
        }

        let _ = self.upkeep.await;
    }
}

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and middleware produce:
//!     → metrics.rs (histogram + counters, rendered on /metrics)
//!     → tracing events
//!         → logging.rs (console layer, LokiLayer → bounded queue)
//!         → loki.rs (batched push to the aggregator)
//! ```

pub mod logging;
pub mod loki;
pub mod metrics;

pub use logging::{
    init_logging, log_channel, loki_targets, LogLevel, LogQueue, LogRecord, LogSink, LokiLayer, SERVICE_NAME,
};
pub use loki::{LokiShipper, PushError};
pub use self::metrics::Metrics;

//! Observable mock API service.
//!
//! Endpoints with artificial latency, failures, memory growth and CPU load,
//! instrumented with Prometheus metrics and structured logs shipped to Loki.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod simulation;

pub use config::ServiceConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::{Shutdown, Telemetry};
pub use observability::Metrics;

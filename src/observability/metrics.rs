//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_request_duration_seconds` (histogram): latency by method, route, status_code
//! - `http_requests_total` (counter): requests by method, route, status_code
//! - `app_errors_total` (counter): simulated failures by route, error_type
//! - `process_start_time_seconds` (gauge): Unix time the registry was created
//!
//! # Design Decisions
//! - Each `Metrics` owns its recorder instead of installing a global one, so
//!   every instance (and every test) has isolated counters
//! - Metric updates go through `metrics::with_local_recorder`; the recorder
//!   itself is atomic, so no extra locking is needed
//! - Histogram buckets are fixed

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use metrics::Unit;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;

pub const REQUEST_DURATION: &str = "http_request_duration_seconds";
pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const ERRORS_TOTAL: &str = "app_errors_total";
pub const PROCESS_START_TIME: &str = "process_start_time_seconds";

/// Histogram buckets for request latency, in seconds.
pub const DURATION_BUCKETS: [f64; 9] = [0.1, 0.3, 0.5, 0.7, 1.0, 3.0, 5.0, 7.0, 10.0];

/// Content type expected by Prometheus scrapers.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Process-wide metrics registry.
#[derive(Clone)]
pub struct Metrics {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
}

impl Metrics {
    /// Build a registry with the request instruments described and bucketed.
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), &DURATION_BUCKETS)
            .expect("duration buckets are non-empty")
            .build_recorder();
        let handle = recorder.handle();

        let metrics = Self {
            recorder: Arc::new(recorder),
            handle,
        };
        metrics.describe();
        metrics
    }

    fn describe(&self) {
        let start = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();

        self.with_recorder(|| {
            metrics::describe_histogram!(
                REQUEST_DURATION,
                Unit::Seconds,
                "Duration of HTTP requests in seconds"
            );
            metrics::describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests");
            metrics::describe_counter!(ERRORS_TOTAL, "Total number of application errors");
            metrics::describe_gauge!(
                PROCESS_START_TIME,
                Unit::Seconds,
                "Start time of the process since unix epoch in seconds"
            );
            metrics::gauge!(PROCESS_START_TIME).set(start);
        });
    }

    fn with_recorder<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(self.recorder.as_ref(), f)
    }

    /// Record one request latency observation.
    pub fn observe_duration(&self, method: &str, route: &str, status: u16, seconds: f64) {
        self.with_recorder(|| {
            metrics::histogram!(
                REQUEST_DURATION,
                "method" => method.to_owned(),
                "route" => route.to_owned(),
                "status_code" => status.to_string()
            )
            .record(seconds);
        });
    }

    /// Count one completed request.
    pub fn increment_request(&self, method: &str, route: &str, status: u16) {
        self.with_recorder(|| {
            metrics::counter!(
                REQUESTS_TOTAL,
                "method" => method.to_owned(),
                "route" => route.to_owned(),
                "status_code" => status.to_string()
            )
            .increment(1);
        });
    }

    /// Count one application error.
    pub fn increment_error(&self, route: &str, error_type: &str) {
        self.with_recorder(|| {
            metrics::counter!(
                ERRORS_TOTAL,
                "route" => route.to_owned(),
                "error_type" => error_type.to_owned()
            )
            .increment(1);
        });
    }

    /// Render all metric families in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Periodically drain histogram buffers until shutdown.
    pub fn spawn_upkeep(&self, interval: Duration, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let handle = self.handle.clone();
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => handle.run_upkeep(),
                    _ = shutdown.recv() => {
                        tracing::debug!("Metrics upkeep stopping");
                        break;
                    }
                }
            }
        })
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

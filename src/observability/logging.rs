//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (console + remote sink)
//! - Convert tracing events into `LogRecord`s for the Loki shipper
//! - Keep the request path independent of the remote sink
//!
//! # Design Decisions
//! - Application code logs with plain `tracing` macros; fields become labels
//! - The remote sink is fed through a bounded queue with `try_send`, so a slow
//!   or unreachable aggregator can only cause dropped records, never blocking
//! - The shipper's own events are excluded from capture to avoid feedback
//! - Console lines carry the service identity too; json console lines have the
//!   same shape as the lines pushed to Loki

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as console, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Identity attached to every record and every Loki stream.
pub const SERVICE_NAME: &str = "mock-api-service";

const CRATE_TARGET: &str = "mock_api_service";
const SHIPPER_TARGET: &str = "mock_api_service::observability::loki";

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl From<&Level> for LogLevel {
    fn from(level: &Level) -> Self {
        match *level {
            Level::TRACE => LogLevel::Trace,
            Level::DEBUG => LogLevel::Debug,
            Level::INFO => LogLevel::Info,
            Level::WARN => LogLevel::Warn,
            Level::ERROR => LogLevel::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured log record. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub service: &'static str,
    pub labels: BTreeMap<String, Value>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>, labels: BTreeMap<String, Value>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            service: SERVICE_NAME,
            labels,
        }
    }

    /// Build a record from a tracing event; fields other than `message` become labels.
    pub fn from_event(event: &Event<'_>) -> Self {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        Self::new(LogLevel::from(event.metadata().level()), visitor.message, visitor.labels)
    }
}

/// Producer side of the remote log queue.
#[derive(Clone)]
pub struct LogSink {
    tx: mpsc::Sender<LogRecord>,
    dropped: Arc<AtomicU64>,
}

/// Consumer side of the remote log queue, owned by the shipper.
pub struct LogQueue {
    pub(crate) rx: mpsc::Receiver<LogRecord>,
    pub(crate) dropped: Arc<AtomicU64>,
}

impl LogQueue {
    /// Next queued record, if one is ready.
    pub fn try_recv(&mut self) -> Option<LogRecord> {
        self.rx.try_recv().ok()
    }
}

/// Create a bounded record queue.
pub fn log_channel(capacity: usize) -> (LogSink, LogQueue) {
    let (tx, rx) = mpsc::channel(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        LogSink {
            tx,
            dropped: dropped.clone(),
        },
        LogQueue { rx, dropped },
    )
}

impl LogSink {
    /// Emit a record to the remote sink. Never blocks; drops when the queue is full.
    pub fn log(&self, level: LogLevel, message: impl Into<String>, labels: BTreeMap<String, Value>) {
        self.send(LogRecord::new(level, message, labels));
    }

    pub fn send(&self, record: LogRecord) {
        if self.tx.try_send(record).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records discarded because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Tracing layer forwarding events to a `LogSink`.
pub struct LokiLayer {
    sink: LogSink,
}

impl LokiLayer {
    pub fn new(sink: LogSink) -> Self {
        Self { sink }
    }
}

impl<S: Subscriber> Layer<S> for LokiLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.sink.send(LogRecord::from_event(event));
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    labels: BTreeMap<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.labels.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.insert(field, Value::from(value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.insert(field, Value::from(format!("{:?}", value)));
        }
    }
}

/// Console format prefixing each line with the service identity.
pub struct ServiceTagged<F>(pub F);

impl<S, N, F> FormatEvent<S, N> for ServiceTagged<F>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    F: FormatEvent<S, N>,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        write!(writer, "{} ", SERVICE_NAME)?;
        self.0.format_event(ctx, writer, event)
    }
}

/// Console format writing each event as one serialized `LogRecord`.
pub struct JsonRecord;

impl<S, N> FormatEvent<S, N> for JsonRecord
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, _ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let line = serde_json::to_string(&LogRecord::from_event(event)).map_err(|_| fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

/// Events from this crate go to Loki; the shipper's own events stay local.
pub fn loki_targets() -> Targets {
    Targets::new()
        .with_target(CRATE_TARGET, LevelFilter::TRACE)
        .with_target(SHIPPER_TARGET, LevelFilter::OFF)
}

/// Install the global subscriber: env filter, console output, optional remote sink.
pub fn init_logging(config: &ObservabilityConfig, sink: Option<LogSink>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let (pretty, json) = match config.log_format {
        LogFormat::Pretty => (Some(console::layer().event_format(ServiceTagged(console::format()))), None),
        LogFormat::Json => (None, Some(console::layer().event_format(JsonRecord))),
    };

    let loki = sink.map(|sink| LokiLayer::new(sink).with_filter(loki_targets()));

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .with(loki)
        .init();
}

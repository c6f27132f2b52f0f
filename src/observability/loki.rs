//! Batched log shipping to Grafana Loki.
//!
//! # Responsibilities
//! - Drain the record queue into an in-memory batch
//! - Push the batch on a fixed interval, or early when it is full
//! - Flush whatever is left on shutdown
//!
//! # Design Decisions
//! - Best effort: failed pushes are retried with backoff, then dropped
//! - Records are grouped into one stream per level
//! - Events logged here never reach Loki (see `logging::loki_targets`)

use std::collections::BTreeMap;
use std::sync::atomic::Ordering;

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::LokiConfig;
use crate::observability::logging::{LogLevel, LogQueue, LogRecord, SERVICE_NAME};
use crate::resilience::backoff::calculate_backoff;

pub const PUSH_PATH: &str = "/loki/api/v1/push";

/// Errors from a single push attempt.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("loki rejected push with status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Body of `POST /loki/api/v1/push`.
#[derive(Debug, Serialize)]
pub(crate) struct PushRequest {
    pub(crate) streams: Vec<Stream>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Stream {
    pub(crate) stream: BTreeMap<&'static str, String>,
    pub(crate) values: Vec<[String; 2]>,
}

impl PushRequest {
    pub(crate) fn from_records(records: &[LogRecord]) -> Self {
        let mut by_level: BTreeMap<LogLevel, Vec<[String; 2]>> = BTreeMap::new();
        for record in records {
            let nanos = record.timestamp.timestamp_nanos_opt().unwrap_or_default();
            let line = serde_json::to_string(record).unwrap_or_else(|_| record.message.clone());
            by_level
                .entry(record.level)
                .or_default()
                .push([nanos.to_string(), line]);
        }

        let streams = by_level
            .into_iter()
            .map(|(level, values)| Stream {
                stream: BTreeMap::from([
                    ("application", SERVICE_NAME.to_string()),
                    ("level", level.as_str().to_string()),
                ]),
                values,
            })
            .collect();

        Self { streams }
    }
}

/// Background worker pushing queued records to Loki.
pub struct LokiShipper {
    client: reqwest::Client,
    push_url: String,
    config: LokiConfig,
    queue: LogQueue,
}

impl LokiShipper {
    pub fn new(config: LokiConfig, queue: LogQueue) -> Result<Self, PushError> {
        // The aggregator is an internal sink; proxy env vars do not apply.
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .no_proxy()
            .build()?;
        let push_url = format!("{}{}", config.url.trim_end_matches('/'), PUSH_PATH);

        Ok(Self {
            client,
            push_url,
            config,
            queue,
        })
    }

    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let interval = self.config.batch_interval();
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut batch: Vec<LogRecord> = Vec::with_capacity(self.config.max_batch_size);

        tracing::info!(url = %self.push_url, interval = ?interval, "Log shipper starting");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush(&mut batch).await;
                }
                received = self.queue.rx.recv() => match received {
                    Some(record) => {
                        batch.push(record);
                        if batch.len() >= self.config.max_batch_size {
                            self.flush(&mut batch).await;
                        }
                    }
                    None => break,
                },
                _ = shutdown.recv() => {
                    tracing::info!("Log shipper received shutdown signal, draining");
                    break;
                }
            }
        }

        while let Some(record) = self.queue.try_recv() {
            batch.push(record);
            if batch.len() >= self.config.max_batch_size {
                self.flush(&mut batch).await;
            }
        }
        self.flush(&mut batch).await;

        let dropped = self.queue.dropped.load(Ordering::Relaxed);
        tracing::info!(dropped, "Log shipper stopped");
    }

    async fn flush(&self, batch: &mut Vec<LogRecord>) {
        if batch.is_empty() {
            return;
        }
        let records = std::mem::take(batch);
        let body = PushRequest::from_records(&records);

        let mut attempt = 0;
        loop {
            match self.push(&body).await {
                Ok(()) => {
                    tracing::debug!(records = records.len(), "Pushed log batch");
                    return;
                }
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = calculate_backoff(
                        attempt,
                        self.config.retry_base_delay_ms,
                        self.config.retry_max_delay_ms,
                    );
                    tracing::debug!(error = %e, attempt, delay = ?delay, "Retrying log push");
                    time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, records = records.len(), "Dropping log batch");
                    return;
                }
            }
        }
    }

    async fn push(&self, body: &PushRequest) -> Result<(), PushError> {
        let response = self.client.post(&self.push_url).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(PushError::Status { status, body })
        }
    }
}

//! Observable Mock API Service
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ request id ──▶ instrument ──▶ panic guard ──▶ handler
//!                               │                              │
//!                               ▼                              ▼
//!                       metrics registry ◀──────────── simulation (faults,
//!                       (/metrics scrape)               latency, leak, cpu)
//!                               │
//!   tracing events ──▶ console (fmt layer)
//!                 └──▶ LokiLayer ──▶ bounded queue ──▶ LokiShipper ──▶ Loki
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use mock_api_service::config::{load_config, validate_config, ConfigError, ServiceConfig};
use mock_api_service::lifecycle::{wait_for_signal, Telemetry};
use mock_api_service::{AppState, HttpServer};

const DRAIN_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "mock-api-service", version, about = "Observable mock API service")]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Port to listen on (default 8000).
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Host to bind (default 0.0.0.0).
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Loki base URL (default http://loki:3100).
    #[arg(long, env = "LOKI_URL")]
    loki_url: Option<String>,

    /// Log level directive, overridden by RUST_LOG.
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Disable log shipping to Loki.
    #[arg(long, env = "LOKI_DISABLED")]
    no_loki: bool,
}

impl Cli {
    fn resolve(&self) -> Result<ServiceConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(host) = &self.host {
            config.listener.host = host.clone();
        }
        if let Some(url) = &self.loki_url {
            config.observability.loki.url = url.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if self.no_loki {
            config.observability.loki.enabled = false;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().resolve()?;

    let telemetry = Telemetry::start(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        loki_enabled = config.observability.loki.enabled,
        loki_url = %config.observability.loki.url,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    let port = listener.local_addr()?.port();

    tracing::info!(event = "server_start", port, "Server started on port {}", port);

    let state = AppState::new(telemetry.metrics().clone());
    HttpServer::new(state).run(listener, wait_for_signal()).await?;

    telemetry.drain(DRAIN_DEADLINE).await;
    Ok(())
}

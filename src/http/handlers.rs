//! Endpoint handlers.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use crate::http::response::{
    CpuResponse, EndpointInfo, HealthResponse, LeakResponse, ServiceInfo, SimulatedFault, TimedMessage,
};
use crate::http::server::AppState;
use crate::observability::metrics::EXPOSITION_CONTENT_TYPE;
use crate::simulation::{cpu, faults, latency};

pub const FAULTY_ROUTE: &str = "/api/faulty";

/// Endpoints listed by `GET /`.
pub const ENDPOINTS: &[EndpointInfo] = &[
    EndpointInfo { path: "/api/fast", description: "Fast responding API" },
    EndpointInfo { path: "/api/slow", description: "Slow responding API (2-5s delay)" },
    EndpointInfo { path: "/api/faulty", description: "Occasionally failing API (40% error rate)" },
    EndpointInfo { path: "/api/memory-leak", description: "Simulates a memory leak (adds 1MB each call)" },
    EndpointInfo { path: "/api/cpu-intensive", description: "CPU intensive operation" },
    EndpointInfo { path: "/metrics", description: "Prometheus metrics endpoint" },
    EndpointInfo { path: "/health", description: "Health check endpoint" },
];

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "Observable Mock API Service",
        version: "1.0.0",
        endpoints: ENDPOINTS,
    })
}

pub async fn fast() -> Json<TimedMessage> {
    tracing::info!(endpoint = "fast", "Fast API called");
    Json(TimedMessage::now("This is a fast response"))
}

pub async fn slow() -> Json<TimedMessage> {
    tracing::info!(endpoint = "slow", state = "starting", "Slow API called - starting delay");

    let delay = latency::slow_delay(&mut rand::thread_rng());
    tokio::time::sleep(delay).await;

    tracing::info!(
        endpoint = "slow",
        state = "completed",
        delay_secs = delay.as_secs_f64(),
        "Slow API responding after delay"
    );
    Json(TimedMessage::now("This is a slow response"))
}

pub async fn faulty(State(state): State<AppState>) -> Response {
    tracing::info!(endpoint = "faulty", "Faulty API called");

    match faults::roll(&mut rand::thread_rng()) {
        Some(kind) => {
            state.metrics.increment_error(FAULTY_ROUTE, kind.as_str());
            tracing::error!(
                endpoint = "faulty",
                errorType = %kind,
                route = FAULTY_ROUTE,
                "Faulty API error: {}",
                kind
            );
            SimulatedFault(kind).into_response()
        }
        None => Json(TimedMessage::now("Faulty endpoint worked this time!")).into_response(),
    }
}

pub async fn memory_leak(State(state): State<AppState>) -> Json<LeakResponse> {
    tracing::info!(endpoint = "memory-leak", "Memory leak simulation API called");

    let total = state.leaks.leak();

    tracing::warn!(
        endpoint = "memory-leak",
        totalLeakedMB = total,
        "Memory leak simulation - added 1MB to memory"
    );
    Json(LeakResponse {
        message: "Memory leak simulated",
        leaked_mb: total,
        time: Utc::now(),
    })
}

/// Blocks the serving worker for the whole computation.
pub async fn cpu_intensive() -> Json<CpuResponse> {
    tracing::info!(endpoint = "cpu-intensive", state = "starting", "CPU intensive API called");

    let run = cpu::burn(cpu::CPU_ITERATIONS);

    tracing::info!(
        endpoint = "cpu-intensive",
        state = "completed",
        duration = %format!("{:.3}", run.duration),
        result = %format!("{:.0}", run.result),
        "CPU intensive operation completed"
    );
    Json(CpuResponse {
        message: "CPU intensive operation completed",
        duration: run.duration,
        time: Utc::now(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], state.metrics.render())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime: state.uptime().as_secs_f64(),
    })
}

//! Response bodies and error mapping.
//!
//! # Design Decisions
//! - Timestamps are RFC 3339 with millisecond precision in UTC
//! - A simulated fault is a value, not a panic: it maps to a typed 500 body
//! - Panics are caught by `CatchPanicLayer` and mapped to a generic 500

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::simulation::FaultKind;

/// Serialize a timestamp the way JavaScript's `Date#toJSON` does.
pub fn iso_millis<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// `{message, time}` body shared by most endpoints.
#[derive(Debug, Serialize)]
pub struct TimedMessage {
    pub message: &'static str,
    #[serde(serialize_with = "iso_millis")]
    pub time: DateTime<Utc>,
}

impl TimedMessage {
    pub fn now(message: &'static str) -> Self {
        Self {
            message,
            time: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LeakResponse {
    pub message: &'static str,
    #[serde(rename = "leakedMB")]
    pub leaked_mb: usize,
    #[serde(serialize_with = "iso_millis")]
    pub time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CpuResponse {
    pub message: &'static str,
    pub duration: f64,
    #[serde(serialize_with = "iso_millis")]
    pub time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime: f64,
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub endpoints: &'static [EndpointInfo],
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'a str>,
    message: String,
}

/// A deliberately failed call to the faulty endpoint.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedFault(pub FaultKind);

impl IntoResponse for SimulatedFault {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: true,
            kind: Some(self.0.as_str()),
            message: format!("Simulated error: {}", self.0),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// JSON 404 for unknown paths.
pub async fn not_found() -> Response {
    let body = ErrorBody {
        error: true,
        kind: None,
        message: "Not Found".to_string(),
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// Convert a caught handler panic into a generic 500.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "Handler panicked");

    let body = ErrorBody {
        error: true,
        kind: None,
        message: "Internal Server Error".to_string(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

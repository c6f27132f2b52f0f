//! Request instrumentation.
//!
//! Wraps every route (including `/metrics`, `/health` and the 404 fallback)
//! and, once the inner service has produced a response, records exactly one
//! duration observation, one request count and one access log line labeled
//! with method, path and final status code.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;

use crate::http::request::request_id;
use crate::http::server::AppState;

pub async fn instrument(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let route = request.uri().path().to_string();
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let id = request_id(&request).unwrap_or("unknown").to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed = start.elapsed().as_secs_f64();

    state.metrics.observe_duration(method.as_str(), &route, status, elapsed);
    state.metrics.increment_request(method.as_str(), &route, status);

    tracing::info!(
        method = %method,
        route = %route,
        statusCode = status,
        duration = %format!("{:.3}", elapsed),
        userAgent = %user_agent,
        request_id = %id,
        "{} {} {}",
        method,
        route,
        status
    );

    response
}

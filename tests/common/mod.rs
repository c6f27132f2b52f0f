//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    routing::post,
    Json, Router,
};
use mock_api_service::http::server::build_router;
use mock_api_service::{AppState, Metrics};
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Fresh state with its own metrics registry and leak store.
pub fn test_state() -> AppState {
    AppState::new(Metrics::new())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("response body is UTF-8")
    }
}

/// Send one GET through a fresh clone of the router.
pub async fn get(app: &Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .uri(uri)
        .header("user-agent", "integration-test")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse { status, headers, body }
}

pub fn app(state: &AppState) -> Router {
    build_router(state.clone())
}

/// First exposition line of `family` containing every needle.
pub fn metric_line<'a>(text: &'a str, family: &str, needles: &[&str]) -> Option<&'a str> {
    let prefix = format!("{family}{{");
    text.lines()
        .find(|line| line.starts_with(&prefix) && needles.iter().all(|n| line.contains(n)))
}

/// Numeric value at the end of an exposition line.
pub fn metric_value(line: &str) -> f64 {
    line.rsplit(' ').next().unwrap().parse().unwrap()
}

pub type Captured = Arc<Mutex<Vec<Value>>>;

/// In-process stand-in for Loki's push API. Records every pushed body.
pub async fn start_loki_capture() -> (SocketAddr, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));

    async fn push(State(captured): State<Captured>, Json(body): Json<Value>) -> StatusCode {
        captured.lock().unwrap().push(body);
        StatusCode::NO_CONTENT
    }

    let router = Router::new()
        .route("/loki/api/v1/push", post(push))
        .with_state(captured.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    (addr, captured)
}

/// All log lines pushed so far, decoded from their JSON payloads.
pub fn pushed_lines(captured: &Captured) -> Vec<Value> {
    captured
        .lock()
        .unwrap()
        .iter()
        .flat_map(|body| body["streams"].as_array().cloned().unwrap_or_default())
        .flat_map(|stream| stream["values"].as_array().cloned().unwrap_or_default())
        .map(|pair| serde_json::from_str(pair[1].as_str().unwrap()).unwrap())
        .collect()
}

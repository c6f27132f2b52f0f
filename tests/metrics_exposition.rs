//! Instrumentation middleware and `/metrics` exposition.

use axum::{http::StatusCode, routing::get};
use mock_api_service::http::server::{routes, with_layers};
use mock_api_service::observability::metrics::EXPOSITION_CONTENT_TYPE;

mod common;

const ROUTES: [&str; 7] = [
    "/",
    "/api/fast",
    "/api/faulty",
    "/api/memory-leak",
    "/api/cpu-intensive",
    "/health",
    "/metrics",
];

#[tokio::test]
async fn test_metrics_content_type_and_families() {
    let state = common::test_state();
    let app = common::app(&state);

    for route in ROUTES {
        common::get(&app, route).await;
    }
    // Keep calling until at least one faulty call has failed.
    let mut attempts = 0;
    while common::get(&app, "/api/faulty").await.status != StatusCode::INTERNAL_SERVER_ERROR {
        attempts += 1;
        assert!(attempts < 200, "faulty endpoint never failed");
    }

    let res = common::get(&app, "/metrics").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.headers["content-type"], EXPOSITION_CONTENT_TYPE);

    let text = res.text();
    assert!(text.contains("# TYPE http_request_duration_seconds histogram"));
    assert!(text.contains("# HELP http_request_duration_seconds Duration of HTTP requests in seconds"));
    assert!(text.contains("# TYPE http_requests_total counter"));
    assert!(text.contains("# TYPE app_errors_total counter"));

    for route in ROUTES {
        let needle = format!("route=\"{route}\"");
        assert!(
            common::metric_line(&text, "http_requests_total", &[&needle, "method=\"GET\""]).is_some(),
            "missing request count for {route}"
        );
        assert!(
            common::metric_line(&text, "http_request_duration_seconds_count", &[&needle]).is_some(),
            "missing duration for {route}"
        );
    }
    assert!(common::metric_line(
        &text,
        "http_requests_total",
        &["route=\"/api/faulty\"", "status_code=\"500\""]
    )
    .is_some());
    assert!(common::metric_line(&text, "app_errors_total", &["route=\"/api/faulty\""]).is_some());
}

#[tokio::test]
async fn test_exactly_one_observation_per_request() {
    let state = common::test_state();
    let app = common::app(&state);

    for _ in 0..3 {
        common::get(&app, "/api/fast").await;
    }
    common::get(&app, "/health").await;
    common::get(&app, "/missing").await;

    let text = state.metrics.render();
    let fast = common::metric_line(&text, "http_requests_total", &["route=\"/api/fast\""]).unwrap();
    assert_eq!(common::metric_value(fast), 3.0);

    let fast_hist =
        common::metric_line(&text, "http_request_duration_seconds_count", &["route=\"/api/fast\""]).unwrap();
    assert_eq!(common::metric_value(fast_hist), 3.0);

    let health = common::metric_line(&text, "http_requests_total", &["route=\"/health\""]).unwrap();
    assert_eq!(common::metric_value(health), 1.0);

    let missing = common::metric_line(
        &text,
        "http_requests_total",
        &["route=\"/missing\"", "status_code=\"404\""],
    )
    .unwrap();
    assert_eq!(common::metric_value(missing), 1.0);
}

#[tokio::test]
async fn test_metrics_scrape_counts_itself_afterwards() {
    let state = common::test_state();
    let app = common::app(&state);

    let first = common::get(&app, "/metrics").await.text();
    assert!(common::metric_line(&first, "http_requests_total", &["route=\"/metrics\""]).is_none());

    let second = common::get(&app, "/metrics").await.text();
    let line = common::metric_line(&second, "http_requests_total", &["route=\"/metrics\""]).unwrap();
    assert_eq!(common::metric_value(line), 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_duration_lands_in_upper_buckets() {
    let state = common::test_state();
    let app = common::app(&state);

    common::get(&app, "/api/slow").await;

    let text = state.metrics.render();
    let below_one = common::metric_line(
        &text,
        "http_request_duration_seconds_bucket",
        &["route=\"/api/slow\"", "le=\"1\""],
    )
    .unwrap();
    assert_eq!(common::metric_value(below_one), 0.0);

    let below_five = common::metric_line(
        &text,
        "http_request_duration_seconds_bucket",
        &["route=\"/api/slow\"", "le=\"5\""],
    )
    .unwrap();
    assert_eq!(common::metric_value(below_five), 1.0);
}

async fn boom() -> &'static str {
    panic!("handler exploded")
}

#[tokio::test]
async fn test_panicking_handler_becomes_counted_500() {
    let state = common::test_state();
    let app = with_layers(routes().route("/boom", get(boom)), state.clone());

    let res = common::get(&app, "/boom").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["message"], "Internal Server Error");

    // The service keeps serving.
    assert_eq!(common::get(&app, "/api/fast").await.status, StatusCode::OK);

    let text = state.metrics.render();
    let line = common::metric_line(
        &text,
        "http_requests_total",
        &["route=\"/boom\"", "status_code=\"500\""],
    )
    .unwrap();
    assert_eq!(common::metric_value(line), 1.0);
}

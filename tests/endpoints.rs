//! Endpoint behavior through the full middleware stack.

use std::collections::HashSet;
use std::time::Duration;

use axum::http::StatusCode;
use mock_api_service::simulation::leak::LEAK_CHUNK_BYTES;
use tokio::time::Instant;

mod common;

#[tokio::test]
async fn test_fast_returns_message_and_time() {
    let state = common::test_state();
    let app = common::app(&state);

    for _ in 0..5 {
        let res = common::get(&app, "/api/fast").await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.headers["content-type"], "application/json");

        let body = res.json();
        assert_eq!(body["message"], "This is a fast response");
        let time = body["time"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(time).is_ok(), "{time}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_waits_between_two_and_five_seconds() {
    let state = common::test_state();
    let app = common::app(&state);

    for _ in 0..10 {
        let start = Instant::now();
        let res = common::get(&app, "/api/slow").await;
        let elapsed = start.elapsed();

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.json()["message"], "This is a slow response");
        assert!(elapsed >= Duration::from_secs(2), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(5), "{elapsed:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_does_not_block_other_requests() {
    let state = common::test_state();
    let app = common::app(&state);

    let slow_app = app.clone();
    let slow = tokio::spawn(async move { common::get(&slow_app, "/api/slow").await });
    tokio::task::yield_now().await;

    let start = Instant::now();
    let fast = common::get(&app, "/api/fast").await;
    assert_eq!(fast.status, StatusCode::OK);
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(!slow.is_finished());

    assert_eq!(slow.await.unwrap().status, StatusCode::OK);
}

#[tokio::test]
async fn test_faulty_error_rate_and_types() {
    let state = common::test_state();
    let app = common::app(&state);

    let calls = 1000;
    let mut errors = 0;
    let mut seen = HashSet::new();
    for _ in 0..calls {
        let res = common::get(&app, "/api/faulty").await;
        let body = res.json();
        match res.status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                errors += 1;
                assert_eq!(body["error"], true);
                let kind = body["type"].as_str().unwrap().to_string();
                assert!(
                    ["timeout", "invalid_data", "service_unavailable"].contains(&kind.as_str()),
                    "{kind}"
                );
                assert_eq!(body["message"], format!("Simulated error: {kind}"));
                seen.insert(kind);
            }
            StatusCode::OK => {
                assert_eq!(body["message"], "Faulty endpoint worked this time!");
                assert!(body["time"].is_string());
            }
            other => panic!("unexpected status {other}"),
        }
    }

    // 0.4 ± ~6 standard deviations for n = 1000.
    let rate = errors as f64 / calls as f64;
    assert!((0.31..0.49).contains(&rate), "{rate}");
    assert_eq!(seen.len(), 3);

    let text = state.metrics.render();
    let total_errors: f64 = ["timeout", "invalid_data", "service_unavailable"]
        .iter()
        .filter_map(|kind| {
            common::metric_line(&text, "app_errors_total", &[&format!("error_type=\"{kind}\"")])
        })
        .map(common::metric_value)
        .sum();
    assert_eq!(total_errors as usize, errors);
}

#[tokio::test]
async fn test_memory_leak_grows_by_one_mebibyte_per_call() {
    let state = common::test_state();
    let app = common::app(&state);

    let mut last = 0;
    for n in 1..=5u64 {
        let res = common::get(&app, "/api/memory-leak").await;
        assert_eq!(res.status, StatusCode::OK);

        let body = res.json();
        assert_eq!(body["message"], "Memory leak simulated");
        let leaked = body["leakedMB"].as_u64().unwrap();
        assert_eq!(leaked, n);
        assert!(leaked > last);
        last = leaked;
    }

    assert_eq!(state.leaks.count(), 5);
    assert_eq!(state.leaks.retained_bytes(), 5 * LEAK_CHUNK_BYTES);
}

#[tokio::test]
async fn test_cpu_intensive_reports_positive_duration() {
    let state = common::test_state();
    let app = common::app(&state);

    let res = common::get(&app, "/api/cpu-intensive").await;
    assert_eq!(res.status, StatusCode::OK);

    let body = res.json();
    assert_eq!(body["message"], "CPU intensive operation completed");
    assert!(body["duration"].as_f64().unwrap() > 0.0);
    assert!(body["time"].is_string());
}

#[tokio::test]
async fn test_health_uptime_is_monotonic() {
    let state = common::test_state();
    let app = common::app(&state);

    let mut previous = -1.0;
    for _ in 0..5 {
        let res = common::get(&app, "/health").await;
        assert_eq!(res.status, StatusCode::OK);

        let body = res.json();
        assert_eq!(body["status"], "ok");
        let uptime = body["uptime"].as_f64().unwrap();
        assert!(uptime >= previous);
        previous = uptime;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let state = common::test_state();
    let app = common::app(&state);

    let body = common::get(&app, "/").await.json();
    assert_eq!(body["name"], "Observable Mock API Service");
    assert_eq!(body["version"], "1.0.0");

    let paths: Vec<&str> = body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(
        paths,
        [
            "/api/fast",
            "/api/slow",
            "/api/faulty",
            "/api/memory-leak",
            "/api/cpu-intensive",
            "/metrics",
            "/health"
        ]
    );
    assert!(body["endpoints"][1]["description"]
        .as_str()
        .unwrap()
        .contains("2-5s"));
}

#[tokio::test]
async fn test_unknown_path_is_json_404() {
    let state = common::test_state();
    let app = common::app(&state);

    let res = common::get(&app, "/api/nope").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["message"], "Not Found");
}

#[tokio::test]
async fn test_request_id_is_assigned() {
    let state = common::test_state();
    let app = common::app(&state);

    let res = common::get(&app, "/api/fast").await;
    let id = res.headers["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok(), "{id}");
}

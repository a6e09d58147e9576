//! Health check and landing page tests.
//!
//! Tests `/health` and `/` against a live database and against a pool that
//! cannot connect.

use axum::http::StatusCode;
use chrono::DateTime;
use paylog_testing::{
    http::{get, read_json, read_text},
    unreachable_app, TestEnv,
};

#[tokio::test]
async fn health_check_returns_success_when_healthy() {
    let env = TestEnv::new().await.expect("failed to create test environment");

    let response = get(env.app(""), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await.expect("health check response should be valid JSON");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    let timestamp = body["timestamp"].as_str().expect("timestamp should be a string");
    DateTime::parse_from_rfc3339(timestamp).expect("timestamp should be RFC 3339");

    env.cleanup().await.expect("cleanup");
}

#[tokio::test]
async fn health_check_is_not_behind_the_allow_list() {
    let env = TestEnv::new().await.expect("failed to create test environment");

    // Neither an empty list nor a non-matching one affects /health.
    for allowed in ["", "192.0.2.1"] {
        let response = get(env.app(allowed), "/health").await;
        assert_eq!(response.status(), StatusCode::OK, "allow-list {allowed:?}");
    }

    env.cleanup().await.expect("cleanup");
}

#[tokio::test]
async fn health_check_reports_unreachable_database() {
    let app = unreachable_app("").expect("router");

    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = read_json(response).await.expect("health check response should be valid JSON");
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["database"], "disconnected");
    assert!(body["error"].is_string());
    assert!(body.get("timestamp").is_none());
}

#[tokio::test]
async fn health_check_handles_concurrent_requests() {
    let env = TestEnv::new().await.expect("failed to create test environment");

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let app = env.app("");
            tokio::spawn(async move { get(app, "/health").await })
        })
        .collect();

    let responses = futures::future::join_all(handles).await;

    for response_result in responses {
        let response = response_result.expect("health check task should complete");
        assert_eq!(response.status(), StatusCode::OK);
    }

    env.cleanup().await.expect("cleanup");
}

#[tokio::test]
async fn health_check_rejects_other_methods() {
    let env = TestEnv::new().await.expect("failed to create test environment");

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(env.app(""), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    env.cleanup().await.expect("cleanup");
}

#[tokio::test]
async fn landing_page_reports_database_time() {
    let env = TestEnv::new().await.expect("failed to create test environment");

    let response = get(env.app(""), "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let text = read_text(response).await.expect("landing page body");
    let time = text
        .strip_prefix("paylog is running. Database time: ")
        .expect("landing page should report database time");
    DateTime::parse_from_rfc3339(time).expect("database time should be RFC 3339");

    env.cleanup().await.expect("cleanup");
}

#[tokio::test]
async fn landing_page_degrades_when_database_is_unreachable() {
    let app = unreachable_app("").expect("router");

    let response = get(app, "/").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(read_text(response).await.expect("body"), "Database unavailable");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = unreachable_app("").expect("router");

    let response = get(app, "/api/unknown").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

//! Health probe, OpenAPI and middleware integration tests.

mod helpers;

use helpers::{setup_test_app, setup_test_app_with, upload_files};
use std::time::Duration;

#[tokio::test]
async fn test_liveness() {
    let app = setup_test_app().await;
    let response = app.client().get("/health/live").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_readiness_reports_live_codes() {
    let app = setup_test_app().await;
    upload_files(app.client(), &[("a.txt", "x")]).await;

    let response = app.client().get("/health/ready").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["storage"], "ready");
    assert_eq!(body["live_codes"], 1);
}

#[tokio::test]
async fn test_readiness_does_not_count_expired_codes() {
    let app = setup_test_app_with(&[("CODE_TTL_SECS", "1")]).await;
    upload_files(app.client(), &[("a.txt", "x")]).await;
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let response = app.client().get("/health/ready").await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["live_codes"], 0);
    // Not swept yet, only hidden
    assert_eq!(app.state.store().len().await, 1);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = setup_test_app().await;
    let response = app.client().get("/api/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert!(body["paths"]["/upload"].is_object());
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = setup_test_app().await;
    let response = app.client().get("/health/live").await;
    let headers = response.headers();
    assert!(headers.get("x-request-id").is_some());
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
}

mod common;

use axum::http::StatusCode;
use std::time::Duration;

#[tokio::test]
async fn test_ping_success() {
    let app = common::create_test_app();
    let server = app.server();

    let response = server.get("/ping").await;

    response.assert_status_ok();

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["storage"]["status"], "ok");
    assert_eq!(json["checks"]["deletion"]["status"], "ok");
}

#[tokio::test]
async fn test_ping_structure() {
    let app = common::create_test_app();
    let server = app.server();

    let response = server.get("/ping").await;
    let json = response.json::<serde_json::Value>();

    assert!(json.get("status").is_some());
    assert!(json.get("version").is_some());
    assert!(json["checks"].get("storage").is_some());
    assert!(json["checks"].get("audit").is_some());
    assert!(json["checks"].get("deletion").is_some());
    assert_eq!(json["checks"]["audit"]["message"], "No sinks configured");
}

#[tokio::test]
async fn test_ping_degraded_after_pipeline_shutdown() {
    let app = common::create_test_app();
    app.state.deletion.shutdown(Duration::from_secs(1)).await;
    let server = app.server();

    let response = server.get("/ping").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["deletion"]["status"], "error");
}

mod common;

use axum::http::{StatusCode, header};
use serde_json::json;
use url_shortener::domain::repositories::UrlRepository;

#[tokio::test]
async fn test_shorten_creates_link_and_issues_identity() {
    let app = common::create_test_app();
    let server = app.server();

    let response = server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/page" }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let json = response.json::<serde_json::Value>();
    let short_url = json["result"].as_str().unwrap();
    assert!(short_url.starts_with(&format!("{}/", common::BASE_URL)));

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("new callers get an identity cookie")
        .to_str()
        .unwrap();
    assert!(cookie.starts_with(&format!("{}=", common::COOKIE_NAME)));

    let stored = app
        .repository
        .find_by_original_url("https://example.com/page")
        .await
        .unwrap()
        .unwrap();
    assert!(short_url.ends_with(&stored.short_id));
}

#[tokio::test]
async fn test_shorten_keeps_existing_identity() {
    let app = common::create_test_app();
    let server = app.server();
    let (name, value) = app.cookie_for("user-1");

    let response = server
        .post("/api/shorten")
        .add_header(name, value)
        .json(&json!({ "url": "https://example.com" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let owned = app.repository.find_by_owner("user-1").await.unwrap();
    assert_eq!(owned.len(), 1);
}

#[tokio::test]
async fn test_shorten_existing_url_conflicts() {
    let app = common::create_test_app();
    app.seed("existing1234", "https://example.com", "someone").await;
    let server = app.server();

    let response = server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let json = response.json::<serde_json::Value>();
    assert_eq!(
        json["result"],
        format!("{}/existing1234", common::BASE_URL)
    );
}

#[tokio::test]
async fn test_shorten_invalid_url() {
    let app = common::create_test_app();
    let server = app.server();

    let response = server
        .post("/api/shorten")
        .json(&json!({ "url": "not-a-valid-url" }))
        .await;

    response.assert_status_bad_request();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_shorten_missing_url_field() {
    let app = common::create_test_app();
    let server = app.server();

    let response = server.post("/api/shorten").json(&json!({})).await;

    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_shorten_publishes_audit_only_on_creation() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("audit.log");
    let app = common::create_test_app_with_audit_file(&path);
    let server = app.server();
    let (name, value) = app.cookie_for("user-1");

    server
        .post("/api/shorten")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "url": "https://example.com/audited" }))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/api/shorten")
        .add_header(name, value)
        .json(&json!({ "url": "https://example.com/audited" }))
        .await
        .assert_status(StatusCode::CONFLICT);

    let events = app.audit_events(&path).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["action"], "shorten");
    assert_eq!(events[0]["user_id"], "user-1");
    assert_eq!(events[0]["url"], "https://example.com/audited");
}

#[tokio::test]
async fn test_shorten_text_body() {
    let app = common::create_test_app();
    let server = app.server();

    let response = server.post("/").text("https://example.com/plain").await;

    response.assert_status(StatusCode::CREATED);
    assert!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    assert!(response.headers().get(header::SET_COOKIE).is_some());
    assert!(response.text().starts_with(&format!("{}/", common::BASE_URL)));

    let again = server.post("/").text("https://example.com/plain").await;
    again.assert_status(StatusCode::CONFLICT);
    assert_eq!(again.text(), response.text());

    server
        .post("/")
        .text("not a url")
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_shorten_batch() {
    let app = common::create_test_app();
    app.seed("existing1234", "https://known.com", "someone").await;
    let server = app.server();

    let response = server
        .post("/api/shorten/batch")
        .json(&json!([
            { "correlation_id": "a", "original_url": "https://one.com" },
            { "correlation_id": "b", "original_url": "https://known.com" },
        ]))
        .await;

    response.assert_status(StatusCode::CREATED);
    let json = response.json::<serde_json::Value>();
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["correlation_id"], "a");
    assert!(
        items[0]["short_url"]
            .as_str()
            .unwrap()
            .starts_with(common::BASE_URL)
    );
    assert_eq!(items[1]["correlation_id"], "b");
    assert_eq!(
        items[1]["short_url"],
        format!("{}/existing1234", common::BASE_URL)
    );

    assert!(
        app.repository
            .find_by_original_url("https://one.com")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_shorten_batch_rejects_invalid_item() {
    let app = common::create_test_app();
    let server = app.server();

    let response = server
        .post("/api/shorten/batch")
        .json(&json!([
            { "correlation_id": "a", "original_url": "https://one.com" },
            { "correlation_id": "b", "original_url": "nope" },
        ]))
        .await;

    response.assert_status_bad_request();
    assert!(app.repository.is_empty());

    server
        .post("/api/shorten/batch")
        .json(&json!([]))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_gzip_request_and_response() {
    use flate2::{Compression, read::GzDecoder, write::GzEncoder};
    use std::io::{Read, Write};

    let app = common::create_test_app();
    let server = app.server();

    let body = json!([
        { "correlation_id": "1", "original_url": "https://gzip.example.com/first" },
        { "correlation_id": "2", "original_url": "https://gzip.example.com/second" },
    ])
    .to_string();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    let response = server
        .post("/api/shorten/batch")
        .add_header(header::CONTENT_TYPE, "application/json")
        .add_header(header::CONTENT_ENCODING, "gzip")
        .add_header(header::ACCEPT_ENCODING, "gzip")
        .bytes(compressed.into())
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(
        response.headers().get(header::CONTENT_ENCODING).unwrap(),
        "gzip"
    );

    let mut decoded = String::new();
    GzDecoder::new(response.as_bytes().as_ref())
        .read_to_string(&mut decoded)
        .unwrap();
    let items: serde_json::Value = serde_json::from_str(&decoded).unwrap();
    assert_eq!(items.as_array().unwrap().len(), 2);
}

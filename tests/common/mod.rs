#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue, header};
use axum_test::TestServer;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url_shortener::application::services::{AuthService, LinkService};
use url_shortener::audit::{AuditDispatcher, AuditSink, FileSink};
use url_shortener::deletion::{BatchConfig, DeletionPipeline};
use url_shortener::domain::entities::UrlRecord;
use url_shortener::domain::repositories::UrlRepository;
use url_shortener::infrastructure::persistence::MemoryUrlRepository;
use url_shortener::routes::router;
use url_shortener::state::AppState;

pub const SECRET: &str = "test-signing-secret";
pub const COOKIE_NAME: &str = "authorization";
pub const BASE_URL: &str = "http://short.test";

/// Application state over an in-memory repository.
pub struct TestApp {
    pub state: AppState,
    pub repository: Arc<MemoryUrlRepository>,
}

impl TestApp {
    pub fn server(&self) -> TestServer {
        TestServer::new(router(self.state.clone())).unwrap()
    }

    /// `Cookie` header carrying a valid identity for `user_id`.
    pub fn cookie_for(&self, user_id: &str) -> (HeaderName, HeaderValue) {
        let value = format!(
            "{COOKIE_NAME}={}",
            self.state.auth_service.sign(user_id)
        );
        (header::COOKIE, HeaderValue::from_str(&value).unwrap())
    }

    /// Closes the audit dispatcher and returns the events written to `path`.
    pub async fn audit_events(&self, path: &Path) -> Vec<serde_json::Value> {
        self.state.audit.shutdown(Duration::from_secs(5)).await;

        match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => panic!("failed to read audit file: {e}"),
        }
    }

    pub async fn seed(&self, short_id: &str, url: &str, owner: &str) {
        self.repository
            .save(UrlRecord::new(short_id, url, owner))
            .await
            .unwrap();
    }
}

pub fn fast_batches() -> BatchConfig {
    BatchConfig {
        max_batch_size: 10,
        flush_interval: Duration::from_millis(20),
        accumulators: 2,
        queue_capacity: 64,
    }
}

pub fn create_test_app() -> TestApp {
    create_test_app_with_sinks(Vec::new())
}

pub fn create_test_app_with_sinks(sinks: Vec<Box<dyn AuditSink>>) -> TestApp {
    let repository = Arc::new(MemoryUrlRepository::new());
    let dyn_repository: Arc<dyn UrlRepository> = repository.clone();

    let audit = Arc::new(AuditDispatcher::new(sinks, 100));
    let deletion = Arc::new(DeletionPipeline::start(
        fast_batches(),
        dyn_repository.clone(),
        CancellationToken::new(),
    ));

    let link_service = Arc::new(LinkService::new(
        dyn_repository,
        audit.clone(),
        deletion.clone(),
        BASE_URL,
    ));
    let auth_service = Arc::new(AuthService::new(SECRET, COOKIE_NAME));

    TestApp {
        state: AppState {
            link_service,
            auth_service,
            audit,
            deletion,
        },
        repository,
    }
}

/// Test app whose audit events are appended to `path`.
pub fn create_test_app_with_audit_file(path: &Path) -> TestApp {
    create_test_app_with_sinks(vec![Box::new(FileSink::new(path))])
}

//! Common test utilities for in-process E2E testing with mocks.
//!
//! The fixture wires the real router, lifecycle service, sqlite store and
//! status ingress together, with the job dispatcher mocked out, so tests can
//! drive the full HTTP surface without external infrastructure.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

use clipshare_core::testing::MockDispatcher;
use clipshare_core::{
    load_config_from_str, Config, SqliteTicketStore, StatusUpdateIngress, TicketService,
    TicketStore,
};
use clipshare_server::api::create_router;
use clipshare_server::state::AppState;

/// Test fixture running the server in-process.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock dispatcher - inspect and fail job deliveries
    pub dispatcher: Arc<MockDispatcher>,
    /// The ticket store backing the server
    pub store: Arc<dyn TicketStore>,
    /// Temporary directory holding the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with a fresh database and mock dispatcher.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config: Config = load_config_from_str(&format!(
            r#"
[dispatch]
url = "http://localhost:1/jobs"

[database]
path = "{}"
"#,
            db_path.display()
        ))
        .expect("test config parses");

        let store: Arc<dyn TicketStore> =
            Arc::new(SqliteTicketStore::new(&db_path).expect("Failed to create ticket store"));
        let dispatcher = Arc::new(MockDispatcher::new());
        let service = Arc::new(TicketService::new(Arc::clone(&store), dispatcher.clone()));

        let (status_tx, status_rx) = mpsc::channel(config.ingress.buffer);
        tokio::spawn(StatusUpdateIngress::new(Arc::clone(&service), status_rx).run());

        let state = Arc::new(AppState::new(config, service, Arc::clone(&store), status_tx));
        let router = create_router(state);

        Self {
            router,
            dispatcher,
            store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
    }

    /// Send a POST request with a raw string body (for malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Send a POST request with raw bytes (for status-update payloads).
    pub async fn post_bytes(&self, path: &str, body: Vec<u8>) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri(path)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}

/// Common test utilities for integration tests
///
/// Builds the full router over an in-memory directory with a seeded
/// generator, so no database is needed.
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use reviewflow_api::app::{build_router, AppState};
use reviewflow_api::config::{Config, DatabaseConfig, RateLimitConfig, StorageBackend};
use reviewflow_shared::directory::InMemoryDirectory;
use reviewflow_shared::engine::ReviewEngine;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::Service as _;

/// Test context containing the router and its backing store
pub struct TestContext {
    pub app: axum::Router,
    pub directory: Arc<InMemoryDirectory>,
}

impl TestContext {
    /// Fresh context with rate limiting disabled
    pub fn new() -> Self {
        Self::with_rate_limit(RateLimitConfig {
            requests_per_second: 0,
            burst: 1,
        })
    }

    pub fn with_rate_limit(rate_limit: RateLimitConfig) -> Self {
        let config = Config {
            database: DatabaseConfig {
                backend: StorageBackend::Memory,
                ..Default::default()
            },
            rate_limit,
            ..Default::default()
        };

        let directory = Arc::new(InMemoryDirectory::new());
        let engine = ReviewEngine::seeded(directory.clone(), 42);
        let app = build_router(AppState::new(engine, config));

        Self { app, directory }
    }

    /// Sends a request and returns the raw response
    pub async fn raw(&mut self, request: Request<Body>) -> Response {
        self.app.call(request).await.unwrap()
    }

    /// Sends a request and returns status and parsed JSON body
    pub async fn send(&mut self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.raw(request).await;
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                panic!("Non-JSON body ({}): {}", status, String::from_utf8_lossy(&body))
            })
        };
        (status, json)
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Creates team "backend" with active members u1, u2, u3
    pub async fn seed_backend(&mut self) {
        let (status, _) = self
            .post(
                "/team/add",
                json!({
                    "team_name": "backend",
                    "members": [
                        { "user_id": "u1", "username": "Alice", "is_active": true },
                        { "user_id": "u2", "username": "Bob", "is_active": true },
                        { "user_id": "u3", "username": "Carol", "is_active": true }
                    ]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    pub async fn create_pr(&mut self, id: &str, author: &str) -> (StatusCode, Value) {
        self.post(
            "/pullRequest/create",
            json!({
                "pull_request_id": id,
                "pull_request_name": format!("Change {id}"),
                "author_id": author
            }),
        )
        .await
    }
}

/// Sorted reviewer IDs from a pull request JSON object
pub fn reviewers(pr: &Value) -> Vec<String> {
    let mut ids: Vec<String> = pr["assigned_reviewers"]
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();
    ids.sort();
    ids
}

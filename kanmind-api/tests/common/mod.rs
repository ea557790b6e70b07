/// Common test utilities for integration tests
///
/// Builds the real router over an in-memory store, so no database is
/// needed. Helpers cover registration and JSON request plumbing.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use kanmind_api::app::{build_router, AppState};
use kanmind_api::config::{ApiConfig, Config, DatabaseConfig, PasswordConfig};
use kanmind_shared::auth::password::HashParams;
use kanmind_shared::store::memory::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct horse";

/// A registered account
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

/// Test context containing the router and its store
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
            run_migrations: false,
        },
        password: PasswordConfig {
            min_length: 8,
            require_mixed: false,
        },
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), store.clone(), test_config())
            .with_hash_params(HashParams::minimal());

        Self {
            app: build_router(state),
            store,
        }
    }

    /// Sends a request and returns status plus parsed JSON body
    ///
    /// Empty bodies parse as `Value::Null`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Token {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("Non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.send("GET", uri, Some(&user.token), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(&user.token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send("PATCH", uri, Some(&user.token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(&user.token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.send("DELETE", uri, Some(&user.token), None).await
    }

    /// Registers `fullname` with a derived email and returns the session
    pub async fn register(&self, fullname: &str) -> TestUser {
        let email = format!(
            "{}@example.com",
            fullname.to_lowercase().replace(' ', ".")
        );

        let (status, body) = self
            .send(
                "POST",
                "/api/registration/",
                None,
                Some(json!({
                    "fullname": fullname,
                    "email": email,
                    "password": PASSWORD,
                    "repeated_password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);

        TestUser {
            id: body["user_id"].as_i64().unwrap(),
            email,
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a board and returns its ID
    pub async fn board(&self, owner: &TestUser, title: &str, members: &[i64]) -> i64 {
        let (status, body) = self
            .post("/api/boards/", owner, json!({ "title": title, "members": members }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "board creation failed: {}", body);
        body["id"].as_i64().unwrap()
    }

    /// Creates a task and returns its ID
    pub async fn task(&self, creator: &TestUser, board_id: i64, extra: Value) -> i64 {
        let mut body = json!({ "board": board_id, "title": "Task" });
        if let (Some(target), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            target.extend(extra.clone());
        }

        let (status, body) = self.post("/api/tasks/", creator, body).await;
        assert_eq!(status, StatusCode::CREATED, "task creation failed: {}", body);
        body["id"].as_i64().unwrap()
    }
}

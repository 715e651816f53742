//! Common test utilities for router-level tests
//!
//! Each [`TestContext`] owns a fresh seeded in-memory store and a recording
//! mailer, so tests are independent and need no external services.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use coophub_api::{
    app::{build_router, AppState},
    config::Config,
};
use coophub_shared::{
    mail::{extract_hash, MemoryMailer},
    seed::{run_all, SeedConfig},
    store::MemoryStore,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const TESTER_EMAIL: &str = "john.doe@example.com";
pub const TESTER_PASSWORD: &str = "secret";
pub const PREFIX: &str = "/api/v1";

const TEST_SECRET: &str = "test-access-secret-at-least-32-bytes";
const TEST_REFRESH_SECRET: &str = "test-refresh-secret-at-least-32-bytes";

pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<MemoryMailer>,
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| {
        let value = match key {
            "DATABASE_URL" => "memory://",
            "AUTH_JWT_SECRET" => TEST_SECRET,
            "AUTH_REFRESH_SECRET" => TEST_REFRESH_SECRET,
            "APP_FRONTEND_DOMAIN" => "http://frontend.test",
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("test config")
}

impl TestContext {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        run_all(store.as_ref(), &SeedConfig::default())
            .await
            .expect("seeding failed");

        let mailer = Arc::new(MemoryMailer::new());
        let state = AppState::new(store.clone(), mailer.clone(), test_config());

        Self {
            app: build_router(state),
            store,
            mailer,
        }
    }

    /// Sends a request and returns the status with the parsed JSON body
    /// (`Value::Null` for empty bodies)
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("{PREFIX}{path}"));

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, body)
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, path, None, Some(body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/auth/email/login",
            json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn admin_login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/auth/admin/email/login",
            json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Logs in through the user endpoint and returns the access token
    pub async fn token_for(&self, email: &str, password: &str) -> String {
        let (status, body) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        let (status, body) = self.admin_login(ADMIN_EMAIL, TESTER_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Registers a user and returns the confirmation hash from the mail
    pub async fn register(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/auth/email/register",
                json!({
                    "email": email,
                    "password": password,
                    "firstName": "Tester",
                    "lastName": "E2E",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT, "register failed: {body}");

        self.mailed_hash(email, "confirm-email")
    }

    /// Hash from the latest mail to `email` carrying `marker/<hash>`
    pub fn mailed_hash(&self, email: &str, marker: &str) -> String {
        let message = self.mailer.last_to(email).expect("no mail sent");
        extract_hash(&message.text, marker)
            .expect("mail carries no hash")
            .to_string()
    }
}

/// Asserts that a user payload exposes no secrets
pub fn assert_sanitized(user: &Value) {
    assert!(user.get("password").is_none(), "password leaked: {user}");
    assert!(user.get("previousPassword").is_none(), "previousPassword leaked: {user}");
    assert!(user.get("hash").is_none(), "hash leaked: {user}");
}

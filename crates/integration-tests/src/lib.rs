//! Integration tests for Saraphan.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests against the in-memory store
//! cargo test -p saraphan-integration-tests
//!
//! # Tests against a running server (seeded with `fixtures/catalog.yaml`)
//! API_BASE_URL=http://127.0.0.1:8000 cargo test -p saraphan-integration-tests -- --ignored
//! ```
//!
//! [`TestApp`] builds the full router (middleware included) over a fresh
//! [`MemoryStore`] and drives it with `tower::ServiceExt::oneshot`, so no
//! socket or database is needed.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use saraphan_api::config::ApiConfig;
use saraphan_api::db::MemoryStore;
use saraphan_api::services::seed::SeedFile;
use saraphan_api::{AppState, app};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Signing key used by every in-process test.
pub const TEST_SECRET_KEY: &str = "k8#Qz!v2Lp@9sWm$4Tn&7Rb^1Yc*6Hd0";

/// Username of the seeded account.
pub const USERNAME: &str = "auth_user";
/// Password of the seeded account.
pub const PASSWORD: &str = "!user_PASSWORD_1!";

/// Three categories, each with one subcategory holding one good priced
/// 1, 2 and 3, plus one user.
pub const FIXTURE: &str = r#"
categories:
  - { name: "Категория 1", slug: category-1 }
  - { name: "Категория 2", slug: category-2 }
  - { name: "Категория 3", slug: category-3 }
subcategories:
  - { name: "Подкатегория 1", slug: subcategory-1, category: category-1 }
  - { name: "Подкатегория 2", slug: subcategory-2, category: category-2 }
  - { name: "Подкатегория 3", slug: subcategory-3, category: category-3 }
goods:
  - { name: "Товар 1", slug: good-1, price: 1, subcategory: subcategory-1 }
  - { name: "Товар 2", slug: good-2, price: 2, subcategory: subcategory-2 }
  - { name: "Товар 3", slug: good-3, price: 3, subcategory: subcategory-3 }
users:
  - { username: auth_user, password: "!user_PASSWORD_1!" }
"#;

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body, `Value::Null` when the body is empty or not JSON.
    pub body: Value,
}

/// The application wired to an in-memory store.
pub struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    /// Empty store with the default local configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ApiConfig::local(SecretString::from(TEST_SECRET_KEY)))
    }

    /// Empty store with a custom configuration.
    #[must_use]
    pub fn with_config(config: ApiConfig) -> Self {
        let state = AppState::new(config, Arc::new(MemoryStore::new()));
        Self {
            router: app(state.clone()),
            state,
        }
    }

    /// Store loaded with [`FIXTURE`].
    pub async fn seeded() -> Self {
        let app = Self::new();
        app.seed(FIXTURE).await;
        app
    }

    /// Load a YAML fixture into the store.
    pub async fn seed(&self, yaml: &str) {
        SeedFile::parse(yaml)
            .unwrap()
            .apply(self.state.store())
            .await
            .unwrap();
    }

    /// Shared application state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Send a request through the router.
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// `GET path`, optionally with a bearer token.
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request(build(Method::GET, path, token, None)).await
    }

    /// `POST path` with a JSON body, optionally with a bearer token.
    pub async fn post(&self, path: &str, body: &Value, token: Option<&str>) -> TestResponse {
        self.request(build(Method::POST, path, token, Some(body)))
            .await
    }

    /// `POST path` with no body.
    pub async fn post_empty(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request(build(Method::POST, path, token, None)).await
    }

    /// Log in and return `(access, refresh)`.
    pub async fn login(&self, username: &str, password: &str) -> (String, String) {
        let response = self
            .post(
                "/api/v1/auth/token/create/",
                &json!({ "username": username, "password": password }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        (
            response.body["access"].as_str().unwrap().to_owned(),
            response.body["refresh"].as_str().unwrap().to_owned(),
        )
    }

    /// Access token of the seeded account.
    pub async fn access_token(&self) -> String {
        self.login(USERNAME, PASSWORD).await.0
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

fn build(method: Method, path: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Base URL of a running server for the ignored live tests.
#[must_use]
pub fn live_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
}

//! Shared harness for the router-level integration tests.
//!
//! Builds the full API router over in-memory storage, a counting repository
//! and a manually driven clock, then drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use inventron_api::{
    create_api_router, hash_password, ApiConfig, AppContext, AuthConfig, JwtSecret, TokenIssuer,
};
use inventron_core::{ManualClock, User};
use inventron_storage::{InMemoryCacheBackend, InMemoryUserStore, ReadThroughCache, UserStore};
use inventron_test_utils::fixtures::{TEST_EPOCH, TEST_PASSWORD, TEST_USERNAME};
use inventron_test_utils::CountingItemRepository;
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-that-is-long-enough";

/// Response pieces the tests inspect.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// All `Set-Cookie` header values.
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect()
    }

    /// The `Set-Cookie` header for a given cookie name.
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        self.set_cookies()
            .into_iter()
            .find(|c| c.starts_with(&prefix))
    }

    /// `name=value` pair for a `Cookie` request header.
    pub fn cookie_pair(&self, name: &str) -> Option<String> {
        self.set_cookie(name)
            .and_then(|c| c.split(';').next().map(str::to_string))
    }

    pub fn error_code(&self) -> Option<&str> {
        self.body.get("code").and_then(Value::as_str)
    }
}

/// A router plus handles on the state behind it.
pub struct TestApp {
    pub router: Router,
    pub repo: CountingItemRepository,
    pub users: Arc<InMemoryUserStore>,
    pub issuer: Arc<TokenIssuer>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::at_unix(TEST_EPOCH));
        let auth_config = AuthConfig {
            jwt_secret: JwtSecret::new(TEST_SECRET.to_string()).expect("test secret"),
            clock: clock.clone(),
            ..AuthConfig::default()
        };
        let issuer = Arc::new(TokenIssuer::new(Arc::new(auth_config)));
        let repo = CountingItemRepository::default();
        let users = Arc::new(InMemoryUserStore::new());

        let app = AppContext {
            items: Arc::new(repo.clone()),
            users: users.clone(),
            cache: ReadThroughCache::with_defaults(Arc::new(InMemoryCacheBackend::new())),
            issuer: issuer.clone(),
        };
        let router = create_api_router(&ApiConfig::default(), app);

        Self {
            router,
            repo,
            users,
            issuer,
            clock,
        }
    }

    /// Store the standard test user directly, skipping the register route.
    pub async fn seed_user(&self) -> User {
        let hash = hash_password(TEST_PASSWORD).expect("hash password");
        self.users
            .create(TEST_USERNAME, &hash)
            .await
            .expect("seed user")
    }

    pub fn advance(&self, secs: u64) {
        self.clock.advance(Duration::from_secs(secs));
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Log in as the seeded user and return the raw login response.
    pub async fn login_response(&self, password: &str) -> TestResponse {
        self.send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(serde_json::json!({ "username": TEST_USERNAME, "password": password })),
        )
        .await
    }

    /// Seed the test user, log in and return the access cookie pair.
    pub async fn authenticated(&self) -> String {
        self.seed_user().await;
        let response = self.login_response(TEST_PASSWORD).await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {:?}", response.body);
        response
            .cookie_pair("access_token")
            .expect("access cookie set on login")
    }
}

// Common test utilities and helper structs
// Shared across all test files to avoid duplication

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::HeaderName, Request, Response, StatusCode},
    Router,
};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;
use url_filter_core::{
    app_config::{AppConfig, CacheBackend},
    build_app_state, build_router,
    cache::{CacheEntry, CacheError, CacheHealth, InMemoryUrlCache, UrlCache},
    models::verdict::Verdict,
    AppState,
};

pub const MULTIPART_BOUNDARY: &str = "----url-filter-test-boundary";

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

impl TestApp {
    /// Send a POST request
    pub fn post(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "POST", uri)
    }

    /// Send a GET request
    pub fn get(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "GET", uri)
    }
}

/// Test request builder
pub struct TestRequest<'a> {
    app: &'a TestApp,
    request: Request<Body>,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: &str, uri: &str) -> Self {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        Self { app, request }
    }

    fn with_body(mut self, content_type: &str, body: Vec<u8>) -> Self {
        self.request = Request::builder()
            .method(self.request.method().clone())
            .uri(self.request.uri().clone())
            .header("content-type", content_type)
            .body(Body::from(body))
            .unwrap();
        self
    }

    /// Add JSON body to request
    pub fn json<T: Serialize>(self, body: &T) -> Self {
        let body_bytes = serde_json::to_vec(body).unwrap();
        self.with_body("application/json", body_bytes)
    }

    /// Add a raw body with an explicit content type
    pub fn raw(self, content_type: &str, body: &str) -> Self {
        self.with_body(content_type, body.as_bytes().to_vec())
    }

    /// Add a multipart/form-data body with a single file field
    pub fn multipart_file(self, field: &str, content: &[u8]) -> Self {
        let body = multipart_body(field, content);
        self.with_body(
            &format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
            body,
        )
    }

    /// Send the request
    pub async fn send(self) -> TestResponse {
        let response = self.app.app.clone().oneshot(self.request).await.unwrap();
        TestResponse { response }
    }
}

/// Build a multipart body carrying one file field
pub fn multipart_body(field: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"page.html\"\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/html\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

/// Test response wrapper
pub struct TestResponse {
    response: Response<Body>,
}

impl TestResponse {
    /// Get status code
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Get a header value as a string
    pub fn header(&self, name: &HeaderName) -> Option<String> {
        self.response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Parse JSON response
    pub async fn json<T: serde::de::DeserializeOwned>(self) -> T {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    /// Get response body as text
    pub async fn text(self) -> String {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }
}

/// Configuration used by the test application: in-memory cache, defaults elsewhere
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.cache.backend = CacheBackend::Memory;
    config
}

/// Setup test application backed by an in-memory cache
pub fn setup_test_app() -> TestApp {
    let config = test_config();
    let cache = Arc::new(InMemoryUrlCache::new(config.cache.ttl()));
    setup_test_app_with(config, cache)
}

/// Setup test application with a specific configuration and cache
pub fn setup_test_app_with(config: AppConfig, cache: Arc<dyn UrlCache>) -> TestApp {
    let state = build_app_state(config, cache);
    let app = build_router(state.clone());
    TestApp { app, state }
}

// =============================================================================
// CACHE DOUBLES
// =============================================================================

/// Cache whose store is permanently unreachable
#[derive(Default)]
pub struct FailingCache {
    pub get_calls: AtomicUsize,
    pub set_calls: AtomicUsize,
}

#[async_trait]
impl UrlCache for FailingCache {
    async fn get(&self, _url: &str) -> Option<CacheEntry> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        None
    }

    async fn set(&self, _url: &str, _verdict: &Verdict) -> Result<(), CacheError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn close(&self) {}

    async fn health(&self) -> CacheHealth {
        CacheHealth {
            backend: self.backend_name().to_string(),
            is_healthy: false,
            latency_ms: 0,
            error: Some("connection refused".to_string()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Cache that never answers within any reasonable deadline
pub struct HangingCache {
    pub delay: Duration,
}

#[async_trait]
impl UrlCache for HangingCache {
    async fn get(&self, _url: &str) -> Option<CacheEntry> {
        tokio::time::sleep(self.delay).await;
        None
    }

    async fn set(&self, _url: &str, _verdict: &Verdict) -> Result<(), CacheError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn close(&self) {}

    async fn health(&self) -> CacheHealth {
        CacheHealth {
            backend: self.backend_name().to_string(),
            is_healthy: true,
            latency_ms: 0,
            error: None,
        }
    }

    fn backend_name(&self) -> &'static str {
        "hanging"
    }
}

/// Pre-seed a cache with a verdict that disagrees with the classifier
pub async fn seed(cache: &dyn UrlCache, url: &str, verdict: Verdict) {
    cache.set(url, &verdict).await.unwrap();
}

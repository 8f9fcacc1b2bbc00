// HTTP API tests for the URL check and HTML filter endpoints

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;

use common::{setup_test_app, setup_test_app_with, test_config, FailingCache};
use url_filter_core::{handlers::url_check::CACHE_STATUS_HEADER, InMemoryUrlCache};

// =============================================================================
// POST /api/check-url
// =============================================================================

#[tokio::test]
async fn test_check_safe_url() {
    let app = setup_test_app();

    let response = app
        .post("/api/check-url")
        .json(&json!({ "url": "https://example.com" }))
        .send()
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await;
    assert_eq!(body["url"], "https://example.com");
    assert_eq!(body["is_malicious"], false);
    assert!(body.get("reason").is_none());
}

#[tokio::test]
async fn test_check_malicious_urls() {
    let app = setup_test_app();
    let cases = vec![
        ("https://malicious.com", "domain is blacklisted"),
        ("https://example.com/file.exe", "suspicious file type"),
        ("https://example.com/malware-download", "contains suspicious keywords"),
        ("http://192.168.1.1", "direct link to an IP address"),
    ];

    for (url, reason) in cases {
        let response = app
            .post("/api/check-url")
            .json(&json!({ "url": url }))
            .send()
            .await;

        assert_eq!(response.status(), StatusCode::OK, "URL: {}", url);
        let body: Value = response.json().await;
        assert_eq!(body["is_malicious"], true, "URL: {}", url);
        assert_eq!(body["reason"], reason, "URL: {}", url);
    }
}

#[tokio::test]
async fn test_check_url_reports_cache_status() {
    let app = setup_test_app();

    let first = app
        .post("/api/check-url")
        .json(&json!({ "url": "https://phish.net" }))
        .send()
        .await;
    assert_eq!(first.header(&CACHE_STATUS_HEADER).as_deref(), Some("stored"));

    let second = app
        .post("/api/check-url")
        .json(&json!({ "url": "https://phish.net" }))
        .send()
        .await;
    assert_eq!(second.header(&CACHE_STATUS_HEADER).as_deref(), Some("hit"));
}

#[tokio::test]
async fn test_check_invalid_urls_rejected() {
    let app = setup_test_app();

    for url in ["not-a-url", "gemini://example.com", "javascript:alert(1)"] {
        let response = app
            .post("/api/check-url")
            .json(&json!({ "url": url }))
            .send()
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "URL: {}", url);
        let body: Value = response.json().await;
        assert_eq!(body["status"], 400);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_check_url_malformed_requests() {
    let app = setup_test_app();

    let response = app
        .post("/api/check-url")
        .json(&json!({ "url": "" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post("/api/check-url")
        .raw("application/json", "{not json")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post("/api/check-url")
        .json(&json!({ "link": "https://example.com" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_check_url_with_unavailable_cache() {
    let cache = Arc::new(FailingCache::default());
    let app = setup_test_app_with(test_config(), cache);

    let response = app
        .post("/api/check-url")
        .json(&json!({ "url": "https://malicious.com" }))
        .send()
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.header(&CACHE_STATUS_HEADER).as_deref(),
        Some("store-failed")
    );
    let body: Value = response.json().await;
    assert_eq!(body["reason"], "domain is blacklisted");
}

#[tokio::test]
async fn test_check_url_strict_cache_writes() {
    let mut config = test_config();
    config.cache.strict_writes = true;
    let app = setup_test_app_with(config, Arc::new(FailingCache::default()));

    let response = app
        .post("/api/check-url")
        .json(&json!({ "url": "https://example.com" }))
        .send()
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await;
    assert_eq!(body["status"], 500);
}

// =============================================================================
// POST /api/filter-html
// =============================================================================

#[tokio::test]
async fn test_filter_html_mixed_document() {
    let app = setup_test_app();
    let html = r#"<a href="https://example.com">ok</a><a href="https://malicious.com">bad</a>"#;

    let response = app
        .post("/api/filter-html")
        .multipart_file("html_file", html.as_bytes())
        .send()
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await;

    let results = body["url_results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["url"], "https://example.com");
    assert_eq!(results[0]["is_malicious"], false);
    assert_eq!(results[1]["url"], "https://malicious.com");
    assert_eq!(results[1]["reason"], "domain is blacklisted");

    let filtered = body["filtered_html"].as_str().unwrap();
    assert!(filtered.contains(r#"<a href="https://example.com">ok</a>"#));
    assert!(filtered.contains(r##"<a href="#" data-malicious="true""##));
    assert!(filtered.contains("[BLOCKED: domain is blacklisted]"));
    assert!(!filtered.contains(r#"href="https://malicious.com""#));
}

#[tokio::test]
async fn test_filter_html_without_urls() {
    let app = setup_test_app();
    let html = "<html><body><p>No links here.</p></body></html>";

    let response = app
        .post("/api/filter-html")
        .multipart_file("html_file", html.as_bytes())
        .send()
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await;
    assert_eq!(body["filtered_html"], html);
    assert_eq!(body["url_results"], json!([]));
}

#[tokio::test]
async fn test_filter_html_missing_field() {
    let app = setup_test_app();

    let response = app
        .post("/api/filter-html")
        .multipart_file("document", b"<p>https://malicious.com</p>")
        .send()
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await;
    assert!(body["error"].as_str().unwrap().contains("html_file"));
}

#[tokio::test]
async fn test_filter_html_rejects_non_multipart_and_non_utf8() {
    let app = setup_test_app();

    let response = app
        .post("/api/filter-html")
        .json(&json!({ "html_file": "<p>hi</p>" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post("/api/filter-html")
        .multipart_file("html_file", &[0x3c, 0x70, 0x3e, 0xff, 0xfe])
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_filter_html_size_limit() {
    let mut config = test_config();
    config.filter.max_html_bytes = 1024;
    let cache = Arc::new(InMemoryUrlCache::new(config.cache.ttl()));
    let app = setup_test_app_with(config, cache);

    let html = "a".repeat(2048);
    let response = app
        .post("/api/filter-html")
        .multipart_file("html_file", html.as_bytes())
        .send()
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_filter_html_strict_cache_failure_aborts() {
    let mut config = test_config();
    config.cache.strict_writes = true;
    let app = setup_test_app_with(config, Arc::new(FailingCache::default()));

    let response = app
        .post("/api/filter-html")
        .multipart_file("html_file", b"<a href=\"https://example.com\">x</a>")
        .send()
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// INDEX, HEALTH, DOCS
// =============================================================================

#[tokio::test]
async fn test_index_lists_endpoints() {
    let app = setup_test_app();

    let response = app.get("/").send().await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await;
    assert_eq!(body["endpoints"]["check_url"], "POST /api/check-url");
}

#[tokio::test]
async fn test_health_reflects_cache_state() {
    let app = setup_test_app();
    let response = app.get("/health").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["cache"]["backend"], "memory");

    let app = setup_test_app_with(test_config(), Arc::new(FailingCache::default()));
    let response = app.get("/health").send().await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await;
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = setup_test_app();

    let response = app.get("/api/docs/openapi.json").send().await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await;
    assert!(body["paths"]["/api/filter-html"].is_object());

    let mut config = test_config();
    config.features.enable_api_docs = false;
    let cache = Arc::new(InMemoryUrlCache::new(config.cache.ttl()));
    let app = setup_test_app_with(config, cache);
    let response = app.get("/api/docs/openapi.json").send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

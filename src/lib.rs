// Library exports for the URL filter service
// This file exposes modules and functions for library consumers

pub mod app;
pub mod app_config;
pub mod cache;
pub mod db;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CacheBackend, ConfigError};
pub use cache::{CacheEntry, CacheError, CacheHealth, InMemoryUrlCache, RedisUrlCache, UrlCache};
pub use db::{RedisConfig, RedisPool};
pub use models::{BlockReason, FilterResult, UrlVerdict, Verdict};
pub use services::{
    CacheStatus, CheckOutcome, UrlFilterError, UrlFilterService, UrlFilterSettings,
};
pub use utils::{extract_urls, rewrite_html, RuleSet, UrlClassifier};

/// Wire the service graph around an already constructed cache
pub fn build_app_state(config: AppConfig, cache: Arc<dyn UrlCache>) -> AppState {
    let classifier = Arc::new(UrlClassifier::new(
        RuleSet::default(),
        config.classifier.max_url_length,
    ));
    let settings = UrlFilterSettings::from_config(&config);
    let url_filter = Arc::new(UrlFilterService::new(cache.clone(), classifier, settings));

    AppState {
        config: Arc::new(config),
        url_filter,
        cache,
    }
}

/// Build the application state from configuration.
///
/// An unreachable Redis does not prevent startup: the service runs without
/// cached verdicts and reconnects on a later request.
pub async fn initialize_app_state(
    config: AppConfig,
) -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    let cache: Arc<dyn UrlCache> = match config.cache.backend {
        CacheBackend::Memory => {
            info!("Using in-memory verdict cache");
            Arc::new(InMemoryUrlCache::new(config.cache.ttl()))
        },
        CacheBackend::Redis => {
            info!("Initializing Redis verdict cache...");
            let pool = RedisPool::new(config.redis.clone())?;
            match pool.connect().await {
                Ok(()) => info!("Redis verdict cache ready"),
                Err(e) => warn!(
                    "Redis unavailable at startup, continuing without cached verdicts: {}",
                    e
                ),
            }
            Arc::new(RedisUrlCache::new(pool, config.cache.ttl()))
        },
    };

    Ok(build_app_state(config, cache))
}

/// Assemble the HTTP router with tracing and CORS layers
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    handlers::api_routes(&state.config)
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            },
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

// Health check handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "healthCheck",
    responses(
        (status = 200, description = "Service and verdict cache are healthy"),
        (status = 503, description = "Verdict cache is unavailable; URLs are still classified")
    )
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();
    let cache_health = state.cache.health().await;

    let response = serde_json::json!({
        "status": if cache_health.is_healthy { "healthy" } else { "degraded" },
        "service": "url-filter",
        "timestamp": timestamp,
        "components": {
            "cache": {
                "backend": cache_health.backend,
                "status": if cache_health.is_healthy { "healthy" } else { "unhealthy" },
                "latency_ms": cache_health.latency_ms,
                "error": cache_health.error
            }
        }
    });

    if cache_health.is_healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

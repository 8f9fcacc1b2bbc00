// Redis-backed verdict cache
// Entries are JSON documents written with SETEX under `url_verdict:{url}`

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::{cache_key, CacheEntry, CacheError, CacheHealth, UrlCache};
use crate::db::RedisPool;
use crate::models::verdict::Verdict;

pub struct RedisUrlCache {
    pool: RedisPool,
    ttl: Duration,
}

impl RedisUrlCache {
    pub fn new(pool: RedisPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    pub fn pool(&self) -> &RedisPool {
        &self.pool
    }

    fn ttl_seconds(&self) -> u64 {
        // SETEX rejects a zero expiry
        self.ttl.as_secs().max(1)
    }
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    async fn get(&self, url: &str) -> Option<CacheEntry> {
        let key = cache_key(url);

        let raw = match self.pool.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Redis cache read failed for {}: {}", url, e);
                return None;
            },
        };

        let entry = match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding undecodable cache entry for {}: {}", url, e);
                return None;
            },
        };

        if entry.verdict().is_none() {
            warn!("Discarding malicious cache entry without reason for {}", url);
            return None;
        }

        debug!("Cache hit for {}", url);
        Some(entry)
    }

    async fn set(&self, url: &str, verdict: &Verdict) -> Result<(), CacheError> {
        if self.pool.is_shut_down() {
            return Err(CacheError::Closed);
        }

        let data = serde_json::to_string(&CacheEntry::new(verdict))
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        self.pool
            .set_with_expiry(&cache_key(url), data, self.ttl_seconds())
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))
    }

    async fn close(&self) {
        self.pool.shutdown().await;
    }

    async fn health(&self) -> CacheHealth {
        let health = self.pool.health_check().await;
        CacheHealth {
            backend: self.backend_name().to_string(),
            is_healthy: health.is_healthy,
            latency_ms: health.latency_ms,
            error: health.error,
        }
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

// Verdict cache: maps a URL string to the verdict computed for it
//
// Entries live for a fixed TTL. Every backend treats its own failures as a
// miss on read and reports them as an error on write.

pub mod memory_cache;
pub mod redis_cache;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::verdict::Verdict;

pub use memory_cache::InMemoryUrlCache;
pub use redis_cache::RedisUrlCache;

/// Key namespace for cached verdicts
pub const VERDICT_KEY_PREFIX: &str = "url_verdict:";

pub fn cache_key(url: &str) -> String {
    format!("{}{}", VERDICT_KEY_PREFIX, url)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache operation timed out after {0}ms")]
    Timeout(u64),

    #[error("Cache serialization error: {0}")]
    Serialization(String),

    #[error("Cache is closed")]
    Closed,
}

/// Stored form of a verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub is_malicious: bool,
    #[serde(default)]
    pub reason: String,
    pub checked_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(verdict: &Verdict) -> Self {
        Self {
            is_malicious: verdict.is_malicious(),
            reason: verdict.reason().to_string(),
            checked_at: Utc::now(),
        }
    }

    /// `None` when the stored parts do not form a valid verdict
    pub fn verdict(&self) -> Option<Verdict> {
        Verdict::from_parts(self.is_malicious, self.reason.clone())
    }
}

/// Backend health snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheHealth {
    pub backend: String,
    pub is_healthy: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
}

#[async_trait]
pub trait UrlCache: Send + Sync {
    /// Look up a verdict. Backend errors and undecodable entries are misses.
    async fn get(&self, url: &str) -> Option<CacheEntry>;

    /// Store a verdict under `url` with the backend's TTL
    async fn set(&self, url: &str, verdict: &Verdict) -> Result<(), CacheError>;

    /// Release connections. Calling it again is a no-op.
    async fn close(&self);

    async fn health(&self) -> CacheHealth;

    fn backend_name(&self) -> &'static str;
}

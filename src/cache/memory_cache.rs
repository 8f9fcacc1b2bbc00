// In-process verdict cache with per-entry expiry
// Used when no Redis is configured and by the test suite

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use super::{CacheEntry, CacheError, CacheHealth, UrlCache};
use crate::models::verdict::Verdict;

/// Expired entries are swept on write once the map grows past this size
const SWEEP_THRESHOLD: usize = 10_000;

struct StoredEntry {
    entry: CacheEntry,
    expires_at: Instant,
}

pub struct InMemoryUrlCache {
    entries: RwLock<HashMap<String, StoredEntry>>,
    ttl: Duration,
    closed: AtomicBool,
}

impl InMemoryUrlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            closed: AtomicBool::new(false),
        }
    }

    /// Number of stored entries, expired ones included until swept
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, stored| stored.expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl UrlCache for InMemoryUrlCache {
    async fn get(&self, url: &str) -> Option<CacheEntry> {
        let entries = self.entries.read().await;
        let stored = entries.get(url)?;

        if stored.expires_at <= Instant::now() {
            return None;
        }

        debug!("Cache hit for {}", url);
        Some(stored.entry.clone())
    }

    async fn set(&self, url: &str, verdict: &Verdict) -> Result<(), CacheError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }

        if self.len().await >= SWEEP_THRESHOLD {
            let removed = self.purge_expired().await;
            debug!("Swept {} expired verdicts", removed);
        }

        self.entries.write().await.insert(
            url.to_string(),
            StoredEntry {
                entry: CacheEntry::new(verdict),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(())
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.entries.write().await.clear();
    }

    async fn health(&self) -> CacheHealth {
        let closed = self.closed.load(Ordering::Acquire);
        CacheHealth {
            backend: self.backend_name().to_string(),
            is_healthy: !closed,
            latency_ms: 0,
            error: closed.then(|| "cache is closed".to_string()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

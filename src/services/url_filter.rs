// URL filter service
// Orchestrates classification, verdict caching, extraction and rewriting

use futures_util::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::app_config::{AppConfig, CacheConfig, FilterConfig};
use crate::cache::{CacheError, UrlCache};
use crate::models::verdict::{BlockReason, FilterResult, UrlVerdict, Verdict};
use crate::utils::html_sanitizer::rewrite_html;
use crate::utils::url_classifier::{InvalidUrlKind, UrlClassifier};
use crate::utils::url_extractor::extract_urls;

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug)]
pub enum UrlFilterError {
    /// The input is not a well-formed URL with an allowed scheme
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] InvalidUrlKind),

    /// A verdict could not be stored and strict cache writes are enabled
    #[error("Failed to cache verdict: {0}")]
    CacheWrite(#[source] CacheError),

    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// RESULT TYPES
// =============================================================================

/// What happened to the cache while checking a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// Verdict came from the cache; nothing was written
    Hit,
    /// Verdict was computed and stored
    Stored,
    /// Verdict was computed but could not be stored
    StoreFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub verdict: Verdict,
    pub cache_status: CacheStatus,
}

impl CheckOutcome {
    /// The verdict is usable but the cache did not take it
    pub fn is_degraded(&self) -> bool {
        matches!(self.cache_status, CacheStatus::StoreFailed(_))
    }
}

// =============================================================================
// SETTINGS
// =============================================================================

#[derive(Debug, Clone)]
pub struct UrlFilterSettings {
    /// Bound on every individual cache read or write
    pub cache_timeout: Duration,
    /// Treat a failed cache write as a fatal error
    pub strict_cache_writes: bool,
    /// Embedded URLs checked at once while filtering a document
    pub concurrency: usize,
}

impl Default for UrlFilterSettings {
    fn default() -> Self {
        Self::from_parts(&CacheConfig::default(), &FilterConfig::default())
    }
}

impl UrlFilterSettings {
    pub fn from_parts(cache: &CacheConfig, filter: &FilterConfig) -> Self {
        Self {
            cache_timeout: cache.timeout(),
            strict_cache_writes: cache.strict_writes,
            concurrency: filter.concurrency.max(1),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::from_parts(&config.cache, &config.filter)
    }
}

// =============================================================================
// SERVICE
// =============================================================================

pub struct UrlFilterService {
    cache: Arc<dyn UrlCache>,
    classifier: Arc<UrlClassifier>,
    settings: UrlFilterSettings,
}

impl UrlFilterService {
    pub fn new(
        cache: Arc<dyn UrlCache>,
        classifier: Arc<UrlClassifier>,
        settings: UrlFilterSettings,
    ) -> Self {
        Self {
            cache,
            classifier,
            settings,
        }
    }

    pub fn classifier(&self) -> &UrlClassifier {
        &self.classifier
    }

    pub fn settings(&self) -> &UrlFilterSettings {
        &self.settings
    }

    /// Check a single URL.
    ///
    /// Malformed input and disallowed schemes are rejected with
    /// [`UrlFilterError::InvalidUrl`] and never reach the cache. Otherwise a
    /// cached verdict is returned as-is, or the URL is classified and the
    /// verdict stored.
    pub async fn check_url(&self, url: &str) -> Result<CheckOutcome, UrlFilterError> {
        self.classifier.validate(url)?;

        if let Some(verdict) = self.cached_verdict(url).await {
            return Ok(CheckOutcome {
                verdict,
                cache_status: CacheStatus::Hit,
            });
        }

        let verdict = self.classifier.classify(url);

        let cache_status = match self.store_verdict(url, &verdict).await {
            Ok(()) => CacheStatus::Stored,
            Err(e) if self.settings.strict_cache_writes => {
                return Err(UrlFilterError::CacheWrite(e));
            },
            Err(e) => {
                warn!("Verdict for {} computed but not cached: {}", url, e);
                CacheStatus::StoreFailed(e.to_string())
            },
        };

        if verdict.is_malicious() {
            info!("Blocked URL {}: {}", url, verdict.reason());
        }

        Ok(CheckOutcome {
            verdict,
            cache_status,
        })
    }

    /// Check every URL embedded in `html` and rewrite the malicious ones.
    ///
    /// Verdicts are returned once per distinct URL, in order of first
    /// appearance. URLs that fail validation are reported as malicious with
    /// reason "invalid format". Any other failure aborts the whole call.
    pub async fn filter_html(&self, html: &str) -> Result<FilterResult, UrlFilterError> {
        let urls = extract_urls(html);
        info!("Filtering document with {} distinct URLs", urls.len());

        let url_results: Vec<UrlVerdict> = stream::iter(urls)
            .map(|url| self.check_embedded(url))
            .buffered(self.settings.concurrency)
            .try_collect()
            .await?;

        let filtered_html = rewrite_html(html, &url_results)
            .map_err(|e| UrlFilterError::Internal(format!("failed to rewrite document: {}", e)))?;

        let result = FilterResult {
            filtered_html,
            url_results,
        };

        info!(
            "Filtered document: {} URLs checked, {} blocked",
            result.url_results.len(),
            result.malicious_count()
        );

        Ok(result)
    }

    async fn check_embedded(&self, url: String) -> Result<UrlVerdict, UrlFilterError> {
        match self.check_url(&url).await {
            Ok(outcome) => Ok(UrlVerdict::new(url, &outcome.verdict)),
            Err(UrlFilterError::InvalidUrl(e)) => {
                debug!("Embedded URL {} is invalid: {}", url, e);
                Ok(UrlVerdict::new(
                    url,
                    &Verdict::blocked(BlockReason::InvalidFormat),
                ))
            },
            Err(e) => Err(e),
        }
    }

    async fn cached_verdict(&self, url: &str) -> Option<Verdict> {
        match tokio::time::timeout(self.settings.cache_timeout, self.cache.get(url)).await {
            Ok(entry) => entry.and_then(|e| e.verdict()),
            Err(_) => {
                warn!(
                    "Cache read for {} timed out after {}ms",
                    url,
                    self.settings.cache_timeout.as_millis()
                );
                None
            },
        }
    }

    async fn store_verdict(&self, url: &str, verdict: &Verdict) -> Result<(), CacheError> {
        tokio::time::timeout(self.settings.cache_timeout, self.cache.set(url, verdict))
            .await
            .map_err(|_| CacheError::Timeout(self.settings.cache_timeout.as_millis() as u64))?
    }
}

// =============================================================================
// TESTS
// =============================================================================

// Centralized configuration management for the URL filter service
// Load ALL env vars ONCE at startup

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::db::RedisConfig;

/// Bounds for the classifier's maximum URL length
pub const MIN_URL_LENGTH_LIMIT: usize = 250;
pub const MAX_URL_LENGTH_LIMIT: usize = 2048;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub classifier: ClassifierConfig,
    pub filter: FilterConfig,
    pub redis: RedisConfig,
    pub features: FeatureConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which verdict cache implementation backs the service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl std::str::FromStr for CacheBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" | "in-memory" | "inmemory" => Ok(CacheBackend::Memory),
            other => Err(ConfigError::InvalidValue(
                "CACHE_BACKEND".to_string(),
                format!("unknown backend '{}', expected redis or memory", other),
            )),
        }
    }
}

/// Verdict cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub ttl_seconds: u64,
    /// Budget for a single cache call; exceeding it counts as "unavailable"
    pub timeout_ms: u64,
    /// Treat a failed cache write as fatal for the request
    pub strict_writes: bool,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            ttl_seconds: 24 * 60 * 60,
            timeout_ms: 3000,
            strict_writes: false,
        }
    }
}

/// Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub max_url_length: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_url_length: MAX_URL_LENGTH_LIMIT,
        }
    }
}

/// Document filtering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Number of per-URL checks in flight during one filter call
    pub concurrency: usize,
    pub max_html_bytes: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            max_html_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Feature flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub enable_api_docs: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            enable_api_docs: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            classifier: ClassifierConfig::default(),
            filter: FilterConfig::default(),
            redis: RedisConfig::default(),
            features: FeatureConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Helper function to get optional env var with default
        let get_or_default = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let parse_u64_or_default = |key: &str, default: &str| -> Result<u64, ConfigError> {
            get_or_default(key, default).parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid u64".to_string())
            })
        };

        let parse_usize_or_default = |key: &str, default: &str| -> Result<usize, ConfigError> {
            get_or_default(key, default).parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid usize".to_string())
            })
        };

        let parse_bool_or_default = |key: &str, default: &str| -> bool {
            get_or_default(key, default).to_lowercase() == "true"
        };

        let bind_address = get_or_default("BIND_ADDRESS", "0.0.0.0:8080");

        let environment = Environment::from(get_or_default("ENVIRONMENT", "development"));
        let cors_allowed_origins: Vec<String> = get_or_default("CORS_ALLOWED_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let backend: CacheBackend = get_or_default("CACHE_BACKEND", "redis").parse()?;
        let ttl_seconds = parse_u64_or_default("CACHE_TTL_SECONDS", "86400")?;
        if ttl_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "CACHE_TTL_SECONDS".to_string(),
                "TTL must be greater than 0".to_string(),
            ));
        }
        let timeout_ms = parse_u64_or_default("CACHE_TIMEOUT_MS", "3000")?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "CACHE_TIMEOUT_MS".to_string(),
                "Timeout must be greater than 0".to_string(),
            ));
        }
        let strict_writes = parse_bool_or_default("CACHE_STRICT_WRITES", "false");

        let max_url_length =
            parse_usize_or_default("MAX_URL_LENGTH", &MAX_URL_LENGTH_LIMIT.to_string())?;
        if !(MIN_URL_LENGTH_LIMIT..=MAX_URL_LENGTH_LIMIT).contains(&max_url_length) {
            return Err(ConfigError::InvalidValue(
                "MAX_URL_LENGTH".to_string(),
                format!(
                    "must be between {} and {} (current: {})",
                    MIN_URL_LENGTH_LIMIT, MAX_URL_LENGTH_LIMIT, max_url_length
                ),
            ));
        }

        let concurrency = parse_usize_or_default("FILTER_CONCURRENCY", "8")?;
        if concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "FILTER_CONCURRENCY".to_string(),
                "Concurrency must be at least 1".to_string(),
            ));
        }
        let max_html_bytes = parse_usize_or_default("MAX_HTML_BYTES", "5242880")?;

        let redis = RedisConfig::from_env();
        if backend == CacheBackend::Redis {
            redis
                .validate()
                .map_err(|e| ConfigError::InvalidValue("REDIS_*".to_string(), e))?;
        }

        let enable_api_docs = parse_bool_or_default("ENABLE_API_DOCS", "true");

        Ok(Self {
            environment,
            server: ServerConfig {
                bind_address,
                cors_allowed_origins,
            },
            cache: CacheConfig {
                backend,
                ttl_seconds,
                timeout_ms,
                strict_writes,
            },
            classifier: ClassifierConfig { max_url_length },
            filter: FilterConfig {
                concurrency,
                max_html_bytes,
            },
            redis,
            features: FeatureConfig { enable_api_docs },
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

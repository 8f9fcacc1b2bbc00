use rand::{thread_rng, Rng};
use redis::{aio::ConnectionManager, Client, RedisError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use super::redis_config::RedisConfig;

/// Maximum delay cap for exponential backoff to prevent extremely long waits
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// After a connection attempt starts, other callers fail fast for this long
/// instead of queueing behind it
const RECONNECT_COOLDOWN: Duration = Duration::from_secs(5);

/// Shared Redis connection handle.
///
/// Wraps a single multiplexed [`ConnectionManager`] that is established lazily
/// on first use, so the service can start while Redis is down and pick the
/// store up once it becomes reachable. Every command is bounded by the
/// configured command timeout.
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
    config: RedisConfig,
    connection: Arc<RwLock<Option<ConnectionManager>>>,
    closed: Arc<AtomicBool>,
    created_at: tokio::time::Instant,
    /// Milliseconds since `created_at` plus one at which the last connection
    /// attempt started; zero when none is pending
    last_attempt_ms: Arc<AtomicU64>,
    connections_created: Arc<AtomicU64>,
    connections_failed: Arc<AtomicU64>,
}

/// Health check status for Redis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisHealth {
    pub is_healthy: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
}

/// Connection metrics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisMetrics {
    pub connections_created: u64,
    pub connections_failed: u64,
    pub connected: bool,
}

impl RedisPool {
    /// Create a new Redis handle. No connection is opened yet.
    #[instrument(skip(config))]
    pub fn new(config: RedisConfig) -> Result<Self, RedisError> {
        config.validate().map_err(|e| {
            error!("Invalid Redis configuration: {}", e);
            RedisError::from((
                redis::ErrorKind::InvalidClientConfig,
                "Invalid configuration",
            ))
        })?;

        info!("Redis URL: {}", mask_redis_url(&config.redis_url));

        let client = Client::open(config.redis_url.as_str())?;

        Ok(Self {
            client,
            config,
            connection: Arc::new(RwLock::new(None)),
            closed: Arc::new(AtomicBool::new(false)),
            created_at: tokio::time::Instant::now(),
            last_attempt_ms: Arc::new(AtomicU64::new(0)),
            connections_created: Arc::new(AtomicU64::new(0)),
            connections_failed: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Eagerly establish the connection (used at startup to surface problems early)
    pub async fn connect(&self) -> Result<(), RedisError> {
        self.get_connection().await.map(|_| ())
    }

    /// Create a connection with retry logic
    async fn create_connection_with_retry(&self) -> Result<ConnectionManager, RedisError> {
        let mut retry_count = 0;
        let mut delay = self.config.retry_delay;

        loop {
            let attempt = tokio::time::timeout(
                self.config.connection_timeout,
                ConnectionManager::new(self.client.clone()),
            )
            .await
            .unwrap_or_else(|_| {
                Err(RedisError::from((
                    redis::ErrorKind::IoError,
                    "Connection timeout",
                    format!(
                        "Redis connection timeout after {}ms",
                        self.config.connection_timeout.as_millis()
                    ),
                )))
            });

            match attempt {
                Ok(conn) => {
                    self.connections_created.fetch_add(1, Ordering::Relaxed);
                    return Ok(conn);
                },
                Err(e) if retry_count + 1 < self.config.retry_attempts => {
                    warn!(
                        "Failed to create Redis connection (attempt {}/{}): {}",
                        retry_count + 1,
                        self.config.retry_attempts,
                        e
                    );
                    self.connections_failed.fetch_add(1, Ordering::Relaxed);

                    sleep(delay).await;

                    // Exponential backoff with jitter and maximum delay cap
                    let jitter = thread_rng().gen_range(0..100);
                    delay =
                        std::cmp::min(delay * 2 + Duration::from_millis(jitter), MAX_RETRY_DELAY);
                    retry_count += 1;
                },
                Err(e) => {
                    self.connections_failed.fetch_add(1, Ordering::Relaxed);
                    error!(
                        "Failed to create Redis connection after {} attempts: {}",
                        self.config.retry_attempts, e
                    );
                    return Err(e);
                },
            }
        }
    }

    /// Get the shared connection, establishing it on first use
    pub async fn get_connection(&self) -> Result<ConnectionManager, RedisError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RedisError::from((
                redis::ErrorKind::IoError,
                "Redis pool is shut down",
            )));
        }

        if let Some(conn) = self.connection.read().await.as_ref() {
            return Ok(conn.clone());
        }

        if self.reconnect_pending() {
            return Err(reconnect_pending_error());
        }

        // Whoever holds the lock is already connecting
        let mut slot = self
            .connection
            .try_write()
            .map_err(|_| reconnect_pending_error())?;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        self.mark_attempt();
        let result = self.create_connection_with_retry().await;

        match result {
            Ok(conn) => {
                self.last_attempt_ms.store(0, Ordering::Release);
                *slot = Some(conn.clone());
                info!("Redis connection established");
                Ok(conn)
            },
            Err(e) => {
                self.mark_attempt();
                Err(e)
            },
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.created_at.elapsed().as_millis() as u64
    }

    fn mark_attempt(&self) {
        self.last_attempt_ms
            .store(self.elapsed_ms() + 1, Ordering::Release);
    }

    /// A connection attempt started within the cooldown window
    fn reconnect_pending(&self) -> bool {
        match self.last_attempt_ms.load(Ordering::Acquire) {
            0 => false,
            marked => {
                self.elapsed_ms() + 1 - marked < RECONNECT_COOLDOWN.as_millis() as u64
            },
        }
    }

    /// Run a command future under the configured command timeout
    async fn with_command_timeout<T, Fut>(&self, fut: Fut) -> Result<T, RedisError>
    where
        Fut: Future<Output = Result<T, RedisError>>,
    {
        match tokio::time::timeout(self.config.command_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RedisError::from((
                redis::ErrorKind::IoError,
                "Redis command timeout",
                format!(
                    "Redis command timeout after {}ms",
                    self.config.command_timeout.as_millis()
                ),
            ))),
        }
    }

    /// Get a raw string value by key
    pub async fn get(&self, key: &str) -> Result<Option<String>, RedisError> {
        let mut conn = self.get_connection().await?;
        self.with_command_timeout(async move {
            redis::cmd("GET")
                .arg(key)
                .query_async::<Option<String>>(&mut conn)
                .await
        })
        .await
    }

    /// Set a value with expiry time in seconds
    pub async fn set_with_expiry(
        &self,
        key: &str,
        value: String,
        expiry_seconds: u64,
    ) -> Result<(), RedisError> {
        let mut conn = self.get_connection().await?;
        self.with_command_timeout(async move {
            redis::cmd("SETEX")
                .arg(key)
                .arg(expiry_seconds)
                .arg(value)
                .query_async::<()>(&mut conn)
                .await
        })
        .await
    }

    /// Perform a health check on Redis
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> RedisHealth {
        let start = Instant::now();

        let result = async {
            let mut conn = self.get_connection().await?;
            self.with_command_timeout(async move {
                redis::cmd("PING").query_async::<String>(&mut conn).await
            })
            .await
        }
        .await;

        match result {
            Ok(_) => RedisHealth {
                is_healthy: true,
                latency_ms: start.elapsed().as_millis() as u64,
                error: None,
            },
            Err(e) => {
                error!("Redis health check failed: {}", e);
                RedisHealth {
                    is_healthy: false,
                    latency_ms: start.elapsed().as_millis() as u64,
                    error: Some(e.to_string()),
                }
            },
        }
    }

    /// Get connection metrics for monitoring
    pub async fn get_metrics(&self) -> RedisMetrics {
        RedisMetrics {
            connections_created: self.connections_created.load(Ordering::Relaxed),
            connections_failed: self.connections_failed.load(Ordering::Relaxed),
            connected: self.connection.read().await.is_some(),
        }
    }

    /// Drop the connection and refuse further commands. Safe to call twice.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.connection.write().await.take();
        info!("Redis pool shutdown complete");
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

fn reconnect_pending_error() -> RedisError {
    RedisError::from((
        redis::ErrorKind::IoError,
        "Redis unavailable",
        format!(
            "connection attempt in progress or failed within the last {}s",
            RECONNECT_COOLDOWN.as_secs()
        ),
    ))
}

/// Mask Redis URL for logging
pub(crate) fn mask_redis_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let host = parsed.host_str().unwrap_or("***");
        let port = parsed.port().unwrap_or(6379);

        if !parsed.username().is_empty() || parsed.password().is_some() {
            format!("redis://***:***@{}:{}", host, port)
        } else {
            format!("redis://{}:{}", host, port)
        }
    } else {
        // Don't expose any part of invalid URL
        "redis://***:***@***:***".to_string()
    }
}

pub mod redis_config;
pub mod redis_pool;

pub use redis_config::RedisConfig;
pub use redis_pool::{RedisHealth, RedisMetrics, RedisPool};

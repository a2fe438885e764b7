//! Redis-backed job queue.

mod queue;

pub use queue::RedisJobQueue;

use crate::error::{JobError, JobResult};
use deadpool_redis::{Config, Pool, Runtime};
use tracing::info;
use workplace_config::JobsConfig;

/// Create a Redis connection pool and check it answers.
pub async fn create_pool(config: &JobsConfig) -> JobResult<Pool> {
    info!("Creating Redis connection pool for job queue...");

    let pool = Config::from_url(&config.redis_url)
        .builder()
        .map_err(|e| JobError::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| JobError::Configuration(format!("Failed to create pool: {}", e)))?;

    let mut conn = pool.get().await?;
    redis::cmd("PING").query_async::<String>(&mut *conn).await?;

    info!("Redis connection pool created successfully");

    Ok(pool)
}

/// Redis key builder for the job queue.
#[derive(Debug, Clone)]
pub struct RedisKeys {
    prefix: String,
}

impl RedisKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Ready jobs of a queue (sorted set by scheduled time).
    pub fn queue(&self, queue_name: &str) -> String {
        format!("{}:queue:{}", self.prefix, queue_name)
    }

    /// Delayed jobs of a queue (sorted set by execution time).
    pub fn delayed(&self, queue_name: &str) -> String {
        format!("{}:delayed:{}", self.prefix, queue_name)
    }

    /// Active jobs (hash: job_id -> worker_id).
    pub fn active(&self) -> String {
        format!("{}:active", self.prefix)
    }

    /// Job data of one job.
    pub fn job(&self, job_id: &str) -> String {
        format!("{}:job:{}", self.prefix, job_id)
    }

    /// Dead letter queue (sorted set by failure time).
    pub fn dlq(&self) -> String {
        format!("{}:dlq", self.prefix)
    }
}

impl Default for RedisKeys {
    fn default() -> Self {
        Self::new("workplace:jobs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_keys() {
        let keys = RedisKeys::new("test");

        assert_eq!(keys.queue("workplace"), "test:queue:workplace");
        assert_eq!(keys.delayed("workplace"), "test:delayed:workplace");
        assert_eq!(keys.active(), "test:active");
        assert_eq!(keys.job("123"), "test:job:123");
        assert_eq!(keys.dlq(), "test:dlq");
    }

    #[test]
    fn test_default_prefix() {
        assert_eq!(RedisKeys::default().dlq(), "workplace:jobs:dlq");
    }
}

//! Redis job queue implementation.

use super::RedisKeys;
use crate::error::{JobError, JobResult};
use crate::job::{Job, JobData, JobId};
use crate::queue::{retry_delay, JobQueue, QueuedJob};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use deadpool_redis::Pool;
use redis::AsyncCommands;
use tracing::{debug, error, warn};
use workplace_config::JobsConfig;

/// Redis-backed job queue.
///
/// Jobs live in per-queue sorted sets scored by their scheduled time in
/// milliseconds; delayed jobs wait in a separate set until due.
pub struct RedisJobQueue {
    pool: Pool,
    keys: RedisKeys,
}

impl RedisJobQueue {
    pub fn new(pool: Pool, config: &JobsConfig) -> Self {
        Self {
            pool,
            keys: RedisKeys::new(&config.key_prefix),
        }
    }

    async fn conn(&self) -> JobResult<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }

    /// Move due delayed jobs of `queue_name` to its ready set.
    pub async fn process_delayed(&self, queue_name: &str) -> JobResult<u64> {
        let mut conn = self.conn().await?;
        let now = Utc::now().timestamp_millis();
        let delayed_key = self.keys.delayed(queue_name);

        let jobs: Vec<(String, f64)> = conn
            .zrangebyscore_withscores(&delayed_key, 0i64, now)
            .await?;

        let mut moved = 0u64;
        for (job_json, score) in jobs {
            let _: () = redis::pipe()
                .atomic()
                .zrem(&delayed_key, &job_json)
                .zadd(self.keys.queue(queue_name), &job_json, score)
                .query_async(&mut *conn)
                .await?;
            moved += 1;
        }

        if moved > 0 {
            debug!(queue = %queue_name, count = moved, "Processed delayed jobs");
        }

        Ok(moved)
    }

    async fn push(&self, job_data: &JobData) -> JobResult<()> {
        let job_json = job_data.to_json()?;
        let score = job_data.scheduled_at.timestamp_millis() as f64;
        let mut conn = self.conn().await?;

        let target = if job_data.is_due(Utc::now()) {
            self.keys.queue(&job_data.queue)
        } else {
            self.keys.delayed(&job_data.queue)
        };

        let _: () = redis::pipe()
            .atomic()
            .set(self.keys.job(job_data.id.as_str()), &job_json)
            .zadd(target, &job_json, score)
            .query_async(&mut *conn)
            .await?;

        Ok(())
    }

    async fn dead_letter(&self, job_data: &JobData, error: &JobError) -> JobResult<()> {
        let mut conn = self.conn().await?;
        let now = Utc::now().timestamp_millis();

        let _: () = redis::pipe()
            .atomic()
            .zadd(self.keys.dlq(), job_data.to_json()?, now as f64)
            .del(self.keys.job(job_data.id.as_str()))
            .query_async(&mut *conn)
            .await?;

        warn!(
            job_id = %job_data.id,
            error = %error,
            attempts = job_data.attempt,
            "Job moved to dead letter queue"
        );

        Ok(())
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue_with<J: Job>(&self, queued: QueuedJob<J>) -> JobResult<JobId> {
        let job_data = queued.build()?;
        self.push(&job_data).await?;

        debug!(
            job_id = %job_data.id,
            queue = %job_data.queue,
            scheduled_at = %job_data.scheduled_at,
            "Enqueued job"
        );

        Ok(job_data.id)
    }

    async fn dequeue(&self, queues: &[&str], worker_id: &str) -> JobResult<Option<JobData>> {
        for queue_name in queues {
            if let Err(e) = self.process_delayed(queue_name).await {
                warn!(queue = %queue_name, error = %e, "Failed to process delayed jobs");
            }
        }

        let mut conn = self.conn().await?;

        for queue_name in queues {
            let result: Vec<(String, f64)> = conn.zpopmin(self.keys.queue(queue_name), 1).await?;

            let Some((job_json, _score)) = result.into_iter().next() else {
                continue;
            };

            match JobData::from_json(&job_json) {
                Ok(mut job_data) => {
                    job_data.increment_attempt();

                    let _: () = redis::pipe()
                        .atomic()
                        .set(self.keys.job(job_data.id.as_str()), job_data.to_json()?)
                        .hset(self.keys.active(), job_data.id.as_str(), worker_id)
                        .query_async(&mut *conn)
                        .await?;

                    debug!(
                        job_id = %job_data.id,
                        queue = %job_data.queue,
                        attempt = job_data.attempt,
                        worker_id = %worker_id,
                        "Dequeued job"
                    );

                    return Ok(Some(job_data));
                }
                Err(e) => {
                    error!(error = %e, "Failed to deserialize job data");
                    continue;
                }
            }
        }

        Ok(None)
    }

    async fn complete(&self, job_id: &JobId) -> JobResult<()> {
        let mut conn = self.conn().await?;

        let removed: u64 = conn.hdel(self.keys.active(), job_id.as_str()).await?;
        let _: () = conn.del(self.keys.job(job_id.as_str())).await?;

        if removed == 0 {
            return Err(JobError::NotFound(job_id.to_string()));
        }

        debug!(job_id = %job_id, "Completed job");
        Ok(())
    }

    async fn fail(&self, job_id: &JobId, error: &JobError) -> JobResult<()> {
        let mut conn = self.conn().await?;

        let job_json: Option<String> = conn.get(self.keys.job(job_id.as_str())).await?;
        let json = job_json.ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

        let mut job_data = JobData::from_json(&json)?;
        job_data.last_error = Some(error.to_string());

        let _: () = conn.hdel(self.keys.active(), job_id.as_str()).await?;

        if error.is_retryable() && !job_data.is_exhausted() {
            let delay = ChronoDuration::from_std(retry_delay(job_data.attempt)).unwrap_or_default();
            job_data.scheduled_at = Utc::now() + delay;
            self.push(&job_data).await?;

            debug!(
                job_id = %job_id,
                attempt = job_data.attempt,
                retry_at = %job_data.scheduled_at,
                "Scheduled job retry"
            );
            Ok(())
        } else {
            self.dead_letter(&job_data, error).await
        }
    }

    async fn queue_length(&self, queue: &str) -> JobResult<u64> {
        let mut conn = self.conn().await?;

        let (ready, delayed): (u64, u64) = redis::pipe()
            .zcard(self.keys.queue(queue))
            .zcard(self.keys.delayed(queue))
            .query_async(&mut *conn)
            .await?;

        Ok(ready + delayed)
    }

    async fn health_check(&self) -> JobResult<()> {
        let mut conn = self.conn().await?;
        redis::cmd("PING").query_async::<String>(&mut *conn).await?;
        Ok(())
    }
}

//! Job queue abstraction.

use crate::error::{JobError, JobResult};
use crate::job::{Job, JobData, JobId};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;

/// Builder for enqueuing jobs with options.
pub struct QueuedJob<J: Job> {
    job: J,
    queue: Option<String>,
    delay: Option<Duration>,
    scheduled_at: Option<DateTime<Utc>>,
    correlation_id: Option<String>,
}

impl<J: Job> QueuedJob<J> {
    /// Create a new queued job builder.
    pub fn new(job: J) -> Self {
        Self {
            job,
            queue: None,
            delay: None,
            scheduled_at: None,
            correlation_id: None,
        }
    }

    /// Place the job on `queue` instead of the job type's default queue.
    pub fn queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    /// Set a delay before execution.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self.scheduled_at = None;
        self
    }

    /// Schedule for a specific time.
    pub fn at(mut self, scheduled_at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(scheduled_at);
        self.delay = None;
        self
    }

    /// Set correlation ID for tracing.
    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Build the job data.
    pub fn build(self) -> JobResult<JobData> {
        let mut data = JobData::new(&self.job)?;
        data.correlation_id = self.correlation_id;
        if let Some(queue) = self.queue {
            data.queue = queue;
        }

        if let Some(at) = self.scheduled_at {
            data.scheduled_at = at;
        } else if let Some(delay) = self.delay {
            let delay = ChronoDuration::from_std(delay)
                .map_err(|e| JobError::Configuration(format!("Delay out of range: {}", e)))?;
            data.scheduled_at = Utc::now() + delay;
        }

        Ok(data)
    }
}

/// Job queue trait for different backends.
///
/// Delivery is at-least-once: a dequeued job stays active until it is
/// completed or failed.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job for immediate execution.
    async fn enqueue<J: Job>(&self, job: J) -> JobResult<JobId> {
        self.enqueue_with(QueuedJob::new(job)).await
    }

    /// Enqueue a job with options.
    async fn enqueue_with<J: Job>(&self, queued: QueuedJob<J>) -> JobResult<JobId>;

    /// Enqueue a job for later execution.
    async fn enqueue_delayed<J: Job>(&self, job: J, delay: Duration) -> JobResult<JobId> {
        self.enqueue_with(QueuedJob::new(job).delay(delay)).await
    }

    /// Enqueue a job at a specific time.
    async fn enqueue_at<J: Job>(&self, job: J, at: DateTime<Utc>) -> JobResult<JobId> {
        self.enqueue_with(QueuedJob::new(job).at(at)).await
    }

    /// Dequeue the next due job from the specified queues, in order.
    async fn dequeue(&self, queues: &[&str], worker_id: &str) -> JobResult<Option<JobData>>;

    /// Complete a job successfully.
    async fn complete(&self, job_id: &JobId) -> JobResult<()>;

    /// Fail a job. It is retried when the error allows and attempts remain,
    /// and dead-lettered otherwise.
    async fn fail(&self, job_id: &JobId, error: &JobError) -> JobResult<()>;

    /// Number of jobs waiting on a queue, delayed ones included.
    async fn queue_length(&self, queue: &str) -> JobResult<u64>;

    /// Health check.
    async fn health_check(&self) -> JobResult<()>;
}

/// Delay before the next attempt of a failed job.
pub fn retry_delay(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(attempt.max(1)).saturating_mul(5).min(300))
}

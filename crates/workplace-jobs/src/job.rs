//! Job trait and definitions.

use crate::error::JobResult;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Creates a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the job ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Job execution context.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Job ID.
    pub job_id: JobId,

    /// Current attempt number (1-based).
    pub attempt: u32,

    /// Queue name.
    pub queue: String,

    /// Job was scheduled at this time.
    pub scheduled_at: DateTime<Utc>,

    /// Job started executing at this time.
    pub started_at: DateTime<Utc>,

    /// Worker ID processing this job.
    pub worker_id: String,
}

/// A unit of work that can be placed on a queue.
///
/// The value itself is the serialized payload; executing it is the job of
/// the handler registered for [`Job::NAME`].
pub trait Job: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Unique name for this job type.
    const NAME: &'static str;

    /// Queue name for this job type.
    const QUEUE: &'static str = "default";

    /// Number of retries after the first attempt.
    const MAX_RETRIES: u32 = 0;

    /// Human-readable title.
    fn title(&self) -> String {
        Self::NAME.to_string()
    }
}

/// Serialized job data stored in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobData {
    /// Job ID.
    pub id: JobId,

    /// Job type name.
    pub name: String,

    /// Human-readable title.
    pub title: String,

    /// Queue name.
    pub queue: String,

    /// Serialized job payload.
    pub payload: String,

    /// Current attempt number.
    pub attempt: u32,

    /// Maximum attempts.
    pub max_attempts: u32,

    /// When the job was created.
    pub created_at: DateTime<Utc>,

    /// When the job should be executed.
    pub scheduled_at: DateTime<Utc>,

    /// Correlation ID for tracing.
    pub correlation_id: Option<String>,

    /// Error from last failed attempt.
    pub last_error: Option<String>,
}

impl JobData {
    /// Creates new job data from a Job instance.
    pub fn new<J: Job>(job: &J) -> JobResult<Self> {
        let payload = serde_json::to_string(job)?;
        let now = Utc::now();

        Ok(Self {
            id: JobId::new(),
            name: J::NAME.to_string(),
            title: job.title(),
            queue: J::QUEUE.to_string(),
            payload,
            attempt: 0,
            max_attempts: J::MAX_RETRIES + 1,
            created_at: now,
            scheduled_at: now,
            correlation_id: None,
            last_error: None,
        })
    }

    /// Deserialize the job payload.
    pub fn deserialize<J: Job>(&self) -> JobResult<J> {
        Ok(serde_json::from_str(&self.payload)?)
    }

    /// Increment attempt counter.
    pub fn increment_attempt(&mut self) {
        self.attempt += 1;
    }

    /// Check if max attempts reached.
    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// Whether the job is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_at <= now
    }

    /// Create job context for execution.
    pub fn to_context(&self, worker_id: &str) -> JobContext {
        JobContext {
            job_id: self.id.clone(),
            attempt: self.attempt,
            queue: self.queue.clone(),
            scheduled_at: self.scheduled_at,
            started_at: Utc::now(),
            worker_id: worker_id.to_string(),
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> JobResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> JobResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct TestJob {
        message: String,
    }

    impl Job for TestJob {
        const NAME: &'static str = "test_job";
        const QUEUE: &'static str = "test";
        const MAX_RETRIES: u32 = 2;
    }

    #[test]
    fn test_job_id_generation() {
        assert_ne!(JobId::new(), JobId::new());
    }

    #[test]
    fn test_job_data_envelope() {
        let job = TestJob {
            message: "Hello".to_string(),
        };

        let data = JobData::new(&job).unwrap();
        assert_eq!(data.name, "test_job");
        assert_eq!(data.title, "test_job");
        assert_eq!(data.queue, "test");
        assert_eq!(data.max_attempts, 3);

        let restored = JobData::from_json(&data.to_json().unwrap()).unwrap();
        assert_eq!(restored, data);
        assert_eq!(restored.deserialize::<TestJob>().unwrap().message, "Hello");
    }

    #[test]
    fn test_attempts() {
        let mut data = JobData::new(&TestJob {
            message: "x".to_string(),
        })
        .unwrap();

        for _ in 0..3 {
            assert!(!data.is_exhausted());
            data.increment_attempt();
        }
        assert!(data.is_exhausted());

        let ctx = data.to_context("worker-1");
        assert_eq!(ctx.attempt, 3);
        assert_eq!(ctx.worker_id, "worker-1");
    }
}

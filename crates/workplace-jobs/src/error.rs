//! Job error types.

use thiserror::Error;
use workplace_core::WorkplaceError;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Job-related errors.
#[derive(Debug, Error)]
pub enum JobError {
    /// Job execution failed.
    #[error("Job execution failed: {0}")]
    ExecutionFailed(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Redis pool error.
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// Job not found.
    #[error("Job not found: {0}")]
    NotFound(String),

    /// No handler is registered for the job name.
    #[error("No handler registered for job type: {0}")]
    UnknownJob(String),

    /// Snapshot storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JobError {
    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            JobError::ExecutionFailed(_)
                | JobError::Redis(_)
                | JobError::Pool(_)
                | JobError::Storage(_)
        )
    }
}

impl From<WorkplaceError> for JobError {
    fn from(err: WorkplaceError) -> Self {
        match err {
            WorkplaceError::Storage(msg) => JobError::Storage(msg),
            WorkplaceError::Configuration(msg) => JobError::Configuration(msg),
            other => JobError::Internal(other.to_string()),
        }
    }
}

impl From<std::io::Error> for JobError {
    fn from(err: std::io::Error) -> Self {
        JobError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(JobError::ExecutionFailed("oops".into()).is_retryable());
        assert!(JobError::Storage("disk full".into()).is_retryable());
        assert!(!JobError::UnknownJob("mystery".into()).is_retryable());
        assert!(!JobError::Configuration("missing key".into()).is_retryable());
    }

    #[test]
    fn test_from_workplace_error() {
        let err = JobError::from(WorkplaceError::Storage("read-only".into()));
        assert!(matches!(err, JobError::Storage(msg) if msg == "read-only"));

        let err = JobError::from(WorkplaceError::Internal("boom".into()));
        match err {
            JobError::Internal(msg) => assert!(msg.contains("boom")),
            _ => panic!("Expected Internal error"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = JobError::UnknownJob("group_snapshot".into());
        assert!(err.to_string().contains("group_snapshot"));
    }
}

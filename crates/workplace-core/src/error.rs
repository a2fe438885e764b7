//! Unified error types for all layers of the Workplace integration.

use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for the Workplace integration.
///
/// None of these variants cross the public gateway or service boundary:
/// remote failures are classified and logged, then surface to callers as
/// "no data". They are used internally and by the infrastructure layers
/// (configuration, cache backends, snapshot storage, job queue).
#[derive(Error, Debug)]
pub enum WorkplaceError {
    // ============ Remote API Errors ============
    /// The remote API answered with a status other than 200.
    #[error("StatusCode: {status}. StatusDescription: {description}.")]
    RemoteStatus { status: u16, description: String },

    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(String),

    // ============ Infrastructure Errors ============
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Redis/Cache error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Snapshot storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WorkplaceError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::RemoteStatus { .. } => "REMOTE_STATUS",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        Self::Configuration(message.into())
    }
}

impl From<serde_json::Error> for WorkplaceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for WorkplaceError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_status_display() {
        let err = WorkplaceError::RemoteStatus {
            status: 503,
            description: "Service Unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "StatusCode: 503. StatusDescription: Service Unavailable."
        );
        assert_eq!(err.error_code(), "REMOTE_STATUS");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            WorkplaceError::Transport("connection reset".into()).error_code(),
            "TRANSPORT_ERROR"
        );
        assert_eq!(
            WorkplaceError::configuration("missing token").error_code(),
            "CONFIGURATION_ERROR"
        );
    }

    #[test]
    fn test_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = WorkplaceError::from(json_err);
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = WorkplaceError::from(io_err);
        assert!(matches!(err, WorkplaceError::Storage(_)));
    }
}

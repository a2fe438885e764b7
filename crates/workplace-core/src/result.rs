//! Result type aliases for the Workplace integration.

use crate::WorkplaceError;

/// A specialized `Result` type for Workplace operations.
pub type WorkplaceResult<T> = Result<T, WorkplaceError>;

//! # Workplace Core
//!
//! Core types, normalized records, and error definitions shared by every
//! layer of the Workplace integration: the gateway, the caching service and
//! the scheduled jobs.

pub mod error;
pub mod records;
pub mod result;
pub mod telemetry;

pub use error::*;
pub use records::*;
pub use result::*;

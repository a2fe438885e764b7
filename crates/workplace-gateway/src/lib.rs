//! # Workplace Gateway
//!
//! Authenticated HTTP access to the Workplace Graph API.
//!
//! Calls never fail outward: every response is classified as a success,
//! a benign absence (Graph error code 100), or a logged failure, and
//! callers receive "no data" for the latter two.

pub mod client;
pub mod endpoints;
pub mod gateway;
pub mod types;

pub use client::GatewayClient;
pub use endpoints::{BatchSubRequest, BatchSubResponse};
pub use gateway::WorkplaceGateway;
pub use types::*;

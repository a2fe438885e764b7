//! # Workplace Server Library
//!
//! Wiring for the background service: dependency injection of the cache,
//! assembly of the gateway and service, and the snapshot job runtime.

pub mod app;
pub mod di;
pub mod startup;

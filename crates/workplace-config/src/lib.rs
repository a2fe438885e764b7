//! # Workplace Config
//!
//! Configuration management for the Workplace integration.
//! Supports layered configuration from files, environment variables
//! (including the legacy flat variables), and runtime refresh.

mod app_config;
mod loader;

pub use app_config::*;
pub use loader::*;

//! # Workplace Service
//!
//! Cached, normalized views of Workplace data on top of the gateway:
//! group feeds, post comments, the group listing, batched profile lookups
//! and the persisted group snapshot.

pub mod cache;
pub mod normalizer;
pub mod profiles;
pub mod snapshot;
mod workplace_service;

#[cfg(test)]
mod test_support;

pub use cache::{CacheExt, CacheInterface, InMemoryCache, RedisCacheService};
pub use profiles::BatchProfileResolver;
pub use workplace_service::WorkplaceService;

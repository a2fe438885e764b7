//! Caching infrastructure for the service layer.
//!
//! A cache abstraction with a Redis implementation and an in-process one.

mod cache_interface;
pub mod cache_keys;
mod memory_cache;
mod redis_cache;

pub use cache_interface::{CacheExt, CacheInterface};
pub use memory_cache::InMemoryCache;
pub use redis_cache::{RedisCacheService, RedisCacheServiceParameters};

//! Dependency injection module using Shaku.
//!
//! The cache backend is chosen at startup:
//! - `RedisCacheModule`: shared Redis cache
//! - `MemoryCacheModule`: per-process cache

use shaku::{module, HasComponent};
use std::sync::Arc;
use tracing::info;
use workplace_config::CacheConfig;
use workplace_core::WorkplaceResult;
use workplace_service::cache::{InMemoryCache, RedisCacheServiceParameters};
use workplace_service::{CacheInterface, RedisCacheService};

module! {
    pub RedisCacheModule {
        components = [RedisCacheService],
        providers = [],
    }
}

module! {
    pub MemoryCacheModule {
        components = [InMemoryCache],
        providers = [],
    }
}

/// Build the cache selected by `config`.
pub fn build_cache(config: &CacheConfig) -> WorkplaceResult<Arc<dyn CacheInterface>> {
    if config.enabled {
        let pool = RedisCacheService::create_pool(&config.redis_url)?;

        let module = RedisCacheModule::builder()
            .with_component_parameters::<RedisCacheService>(RedisCacheServiceParameters {
                pool: Some(pool),
            })
            .build();

        info!(prefix = %config.key_prefix, "Using Redis cache");
        Ok(HasComponent::<dyn CacheInterface>::resolve(&module))
    } else {
        let module = MemoryCacheModule::builder().build();

        info!("Using in-memory cache");
        Ok(HasComponent::<dyn CacheInterface>::resolve(&module))
    }
}

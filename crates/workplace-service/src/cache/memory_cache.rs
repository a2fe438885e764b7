//! In-process cache with lazy expiry.

use super::CacheInterface;
use async_trait::async_trait;
use parking_lot::RwLock;
use shaku::Component;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;
use workplace_core::WorkplaceResult;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory cache for single-process runs and tests.
///
/// Expired entries are dropped when they are read; there is no sweep.
#[derive(Component, Default)]
#[shaku(interface = CacheInterface)]
pub struct InMemoryCache {
    #[shaku(default)]
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl CacheInterface for InMemoryCache {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn get_raw(&self, key: &str) -> WorkplaceResult<Option<String>> {
        let now = Instant::now();

        let live = {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => Some(Some(entry.value.clone())),
                Some(_) => None,
                None => Some(None),
            }
        };

        let value = match live {
            Some(value) => value,
            None => {
                let mut entries = self.entries.write();
                if entries.get(key).is_some_and(|e| !e.is_live(now)) {
                    entries.remove(key);
                }
                None
            }
        };

        match &value {
            Some(_) => debug!(cache_key = key, "Cache hit"),
            None => debug!(cache_key = key, "Cache miss"),
        }

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> WorkplaceResult<()> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(key.to_string(), entry);
        debug!(cache_key = key, ttl_secs = ttl.as_secs(), "Cached response");
        Ok(())
    }

    async fn delete(&self, key: &str) -> WorkplaceResult<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> WorkplaceResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .get(key)
            .is_some_and(|entry| entry.is_live(now)))
    }
}

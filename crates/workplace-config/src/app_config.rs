//! Application configuration structures.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use workplace_core::telemetry::LoggingConfig;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Remote API gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Response cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Group snapshot configuration.
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Job queue configuration.
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "workplace-integration".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Remote API gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL for every API call.
    pub base_url: String,
    /// Static bearer token. Required.
    pub bearer_token: String,
    /// Community id used by the group listing endpoint. Required.
    pub community_id: String,
    /// Outbound proxy host.
    pub proxy_host: Option<String>,
    /// Outbound proxy port.
    pub proxy_port: Option<u16>,
    /// Page size used when listing all groups.
    pub group_limit: u32,
    /// Fields requested for each profile in a batched lookup.
    pub profile_return_fields: String,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.facebook.com".to_string(),
            bearer_token: String::new(),
            community_id: String::new(),
            proxy_host: None,
            proxy_port: None,
            group_limit: 500,
            profile_return_fields: "link".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Returns the proxy URL when both host and port are configured.
    #[must_use]
    pub fn proxy_url(&self) -> Option<String> {
        match (&self.proxy_host, self.proxy_port) {
            (Some(host), Some(port)) if !host.trim().is_empty() => {
                Some(format!("http://{}:{}", host.trim(), port))
            }
            _ => None,
        }
    }

    /// Returns the request timeout as a Duration.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Use Redis for cached responses; an in-memory cache is used otherwise.
    pub enabled: bool,
    /// Redis URL.
    pub redis_url: String,
    /// Prefix for every cache key.
    pub key_prefix: String,
    /// Lifetime of cached group feeds in seconds.
    pub posts_feed_ttl_secs: u64,
    /// Lifetime of cached post comments in seconds.
    pub post_comments_ttl_secs: u64,
    /// Lifetime of the cached group listing in seconds (just under a day).
    pub groups_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "workplace:cache".to_string(),
            posts_feed_ttl_secs: 60,
            post_comments_ttl_secs: 60,
            groups_ttl_secs: 86_000,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn posts_feed_ttl(&self) -> Duration {
        Duration::from_secs(self.posts_feed_ttl_secs)
    }

    #[must_use]
    pub const fn post_comments_ttl(&self) -> Duration {
        Duration::from_secs(self.post_comments_ttl_secs)
    }

    #[must_use]
    pub const fn groups_ttl(&self) -> Duration {
        Duration::from_secs(self.groups_ttl_secs)
    }
}

/// Group snapshot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Root of the protected storage area.
    pub storage_root: PathBuf,
    /// Folder under the storage root holding the snapshot.
    pub secure_folder: String,
    /// Snapshot file name.
    pub group_filename: String,
    /// Principal group granted access to the secure folder.
    pub admin_group: String,
    /// Delay before the next snapshot run, in seconds.
    pub reschedule_secs: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("./assets"),
            secure_folder: "Workplace".to_string(),
            group_filename: "workplace-groups.txt".to_string(),
            admin_group: "administrators".to_string(),
            reschedule_secs: 86_400,
        }
    }
}

impl SnapshotConfig {
    /// Full path of the snapshot file.
    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        self.storage_root
            .join(&self.secure_folder)
            .join(&self.group_filename)
    }

    #[must_use]
    pub const fn reschedule_delay(&self) -> Duration {
        Duration::from_secs(self.reschedule_secs)
    }
}

/// Job queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Use Redis for the job queue; an in-process queue is used otherwise.
    pub redis_enabled: bool,
    /// Redis URL.
    pub redis_url: String,
    /// Connection pool size.
    pub pool_size: usize,
    /// Prefix for job-related keys.
    pub key_prefix: String,
    /// Queue the snapshot job is placed on.
    pub queue: String,
    /// Worker polling interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            redis_enabled: false,
            redis_url: "redis://localhost:6379".to_string(),
            pool_size: 4,
            key_prefix: "workplace:jobs".to_string(),
            queue: "workplace".to_string(),
            poll_interval_ms: 1_000,
        }
    }
}

impl JobsConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.base_url, "https://graph.facebook.com");
        assert_eq!(config.group_limit, 500);
        assert_eq!(config.profile_return_fields, "link");
        assert!(config.proxy_url().is_none());
    }

    #[test]
    fn test_proxy_requires_host_and_port() {
        let mut config = GatewayConfig {
            proxy_host: Some("proxy.internal".to_string()),
            ..GatewayConfig::default()
        };
        assert!(config.proxy_url().is_none());

        config.proxy_port = Some(3128);
        assert_eq!(config.proxy_url().as_deref(), Some("http://proxy.internal:3128"));

        config.proxy_host = None;
        assert!(config.proxy_url().is_none());
    }

    #[test]
    fn test_cache_ttls() {
        let config = CacheConfig::default();
        assert_eq!(config.posts_feed_ttl(), Duration::from_secs(60));
        assert_eq!(config.post_comments_ttl(), Duration::from_secs(60));
        assert_eq!(config.groups_ttl(), Duration::from_secs(86_000));
    }

    #[test]
    fn test_snapshot_path() {
        let config = SnapshotConfig {
            storage_root: PathBuf::from("/srv/assets"),
            ..SnapshotConfig::default()
        };
        assert_eq!(
            config.file_path(),
            PathBuf::from("/srv/assets/Workplace/workplace-groups.txt")
        );
        assert_eq!(config.reschedule_delay(), Duration::from_secs(86_400));
    }
}

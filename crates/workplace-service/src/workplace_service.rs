//! Cached, normalized access to Workplace data.

use crate::cache::{cache_keys, CacheExt, CacheInterface};
use crate::normalizer::{data_items, normalize_comment, normalize_groups, normalize_post};
use crate::profiles::BatchProfileResolver;
use crate::snapshot::decode_snapshot;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use workplace_config::{CacheConfig, SnapshotConfig};
use workplace_core::{
    CommentOrder, GroupRecord, NormalizedComment, NormalizedPost, ProfileLookupResult,
};
use workplace_gateway::WorkplaceGateway;

/// Read-through cache over the gateway.
///
/// A miss calls the gateway, normalizes the `data` array and caches the
/// result under the operation's TTL. A failed call returns `None` and is
/// never cached. Cache backend errors count as a miss on read and are
/// ignored on write.
#[derive(Clone)]
pub struct WorkplaceService {
    gateway: Arc<dyn WorkplaceGateway>,
    cache: Arc<dyn CacheInterface>,
    profiles: BatchProfileResolver,
    cache_config: CacheConfig,
    snapshot_config: SnapshotConfig,
}

impl WorkplaceService {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn WorkplaceGateway>,
        cache: Arc<dyn CacheInterface>,
        cache_config: CacheConfig,
        snapshot_config: SnapshotConfig,
    ) -> Self {
        Self {
            profiles: BatchProfileResolver::new(Arc::clone(&gateway)),
            gateway,
            cache,
            cache_config,
            snapshot_config,
        }
    }

    /// Posts of a group feed.
    pub async fn posts_from_group(
        &self,
        group_id: &str,
        limit: Option<u32>,
    ) -> Option<Vec<NormalizedPost>> {
        let key = cache_keys::posts_from_group(&self.cache_config.key_prefix, group_id, limit);

        self.read_through(
            &key,
            self.cache_config.posts_feed_ttl(),
            || self.gateway.posts_from_group(group_id, limit),
            |body| data_items(body).iter().map(normalize_post).collect(),
        )
        .await
    }

    /// Comments of a post in the requested order.
    ///
    /// Each order is fetched and cached separately.
    pub async fn post_comments(
        &self,
        post_id: &str,
        limit: Option<u32>,
        order: CommentOrder,
    ) -> Option<Vec<NormalizedComment>> {
        let key =
            cache_keys::post_comments(&self.cache_config.key_prefix, post_id, limit, order);

        self.read_through(
            &key,
            self.cache_config.post_comments_ttl(),
            || self.gateway.post_comments(post_id, limit, Some(order)),
            |body| data_items(body).iter().map(normalize_comment).collect(),
        )
        .await
    }

    /// Every group of the community, as id to name.
    pub async fn all_groups(&self) -> Option<GroupRecord> {
        let key = cache_keys::all_groups(&self.cache_config.key_prefix);

        self.read_through(
            &key,
            self.cache_config.groups_ttl(),
            || self.gateway.all_groups(),
            |body| normalize_groups(&data_items(body)),
        )
        .await
    }

    /// Profiles for each identity in `users`, keyed like the input.
    ///
    /// Not cached.
    pub async fn resolve_profiles<K>(
        &self,
        users: &BTreeMap<K, String>,
    ) -> Option<ProfileLookupResult<K>>
    where
        K: Ord + Clone + Send + Sync,
    {
        self.profiles.resolve(users).await
    }

    /// Location of the group snapshot file.
    #[must_use]
    pub fn group_snapshot_path(&self) -> PathBuf {
        self.snapshot_config.file_path()
    }

    /// The last snapshot written, or an empty record when there is none
    /// or it cannot be decoded.
    pub async fn read_group_snapshot(&self) -> GroupRecord {
        let path = self.group_snapshot_path();

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No group snapshot yet");
                return GroupRecord::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read group snapshot");
                return GroupRecord::new();
            }
        };

        decode_snapshot(&bytes).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Failed to decode group snapshot");
            GroupRecord::new()
        })
    }

    async fn read_through<T, F, Fut, N>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
        normalize: N,
    ) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<String>>,
        N: FnOnce(&str) -> T,
    {
        match self.cache.get::<T>(key).await {
            Ok(Some(cached)) => return Some(cached),
            Ok(None) => {}
            Err(e) => warn!(cache_key = key, error = %e, "Cache read failed; treating as miss"),
        }

        let body = fetch().await?;
        let value = normalize(&body);

        if let Err(e) = self.cache.set(key, &value, ttl).await {
            warn!(cache_key = key, error = %e, "Cache write failed");
        }

        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::snapshot::encode_snapshot;
    use crate::test_support::{
        comments_body, groups_body, posts_body, MockGateway, T1, T2,
    };
    use mockall::predicate::eq;
    use tempfile::TempDir;

    fn service_with(gateway: MockGateway, cache: Arc<InMemoryCache>) -> WorkplaceService {
        WorkplaceService::new(
            Arc::new(gateway),
            cache,
            CacheConfig::default(),
            SnapshotConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_posts_miss_then_hit() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_posts_from_group()
            .with(eq("1234"), eq(Some(5u32)))
            .times(1)
            .returning(|_, _| Some(posts_body()));

        let service = service_with(gateway, Arc::new(InMemoryCache::new()));

        let first = service.posts_from_group("1234", Some(5)).await.unwrap();
        let second = service.posts_from_group("1234", Some(5)).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        assert_eq!(first[0].author_name, "Test User");
        assert_eq!(
            first[0].message,
            "Lorem ipsum dolor sit amet, consectetuer adipiscing elit. Aenean commodo ligula eget dolor."
        );
    }

    #[tokio::test]
    async fn test_cached_value_served_without_gateway() {
        let gateway = MockGateway::new();
        let cache = Arc::new(InMemoryCache::new());
        let key = cache_keys::posts_from_group(&CacheConfig::default().key_prefix, "1234", None);
        let cached = vec![NormalizedPost {
            id: "cached".to_string(),
            ..NormalizedPost::default()
        }];
        cache
            .set(&key, &cached, Duration::from_secs(60))
            .await
            .unwrap();

        let service = service_with(gateway, cache);
        let posts = service.posts_from_group("1234", None).await.unwrap();
        assert_eq!(posts, cached);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let mut gateway = MockGateway::new();
        let mut calls = 0;
        gateway
            .expect_posts_from_group()
            .times(2)
            .returning(move |_, _| {
                calls += 1;
                if calls == 1 {
                    None
                } else {
                    Some(posts_body())
                }
            });

        let cache = Arc::new(InMemoryCache::new());
        let service = service_with(gateway, Arc::clone(&cache));

        assert!(service.posts_from_group("1234", None).await.is_none());
        assert!(cache.is_empty());
        assert_eq!(service.posts_from_group("1234", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_data_is_cached_as_empty() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_posts_from_group()
            .times(1)
            .returning(|_, _| Some(r#"{"paging":{}}"#.to_string()));

        let service = service_with(gateway, Arc::new(InMemoryCache::new()));

        assert_eq!(service.posts_from_group("1", None).await, Some(Vec::new()));
        assert_eq!(service.posts_from_group("1", None).await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_comment_orders_cached_independently() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_post_comments()
            .with(eq("42"), eq(None::<u32>), eq(Some(CommentOrder::Chronological)))
            .times(1)
            .returning(|_, _, _| Some(comments_body(CommentOrder::Chronological)));
        gateway
            .expect_post_comments()
            .with(eq("42"), eq(None::<u32>), eq(Some(CommentOrder::ReverseChronological)))
            .times(1)
            .returning(|_, _, _| Some(comments_body(CommentOrder::ReverseChronological)));

        let service = service_with(gateway, Arc::new(InMemoryCache::new()));

        let forward = service
            .post_comments("42", None, CommentOrder::Chronological)
            .await
            .unwrap();
        let reverse = service
            .post_comments("42", None, CommentOrder::ReverseChronological)
            .await
            .unwrap();
        let forward_again = service
            .post_comments("42", None, CommentOrder::Chronological)
            .await
            .unwrap();

        let times = |comments: &[NormalizedComment]| {
            comments
                .iter()
                .map(|c| c.created_time.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(times(&forward), vec![T1, T2]);
        assert_eq!(times(&reverse), vec![T2, T1]);
        assert_eq!(forward_again, forward);
    }

    #[tokio::test]
    async fn test_all_groups() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_all_groups()
            .times(1)
            .returning(|| Some(groups_body()));

        let service = service_with(gateway, Arc::new(InMemoryCache::new()));

        let groups = service.all_groups().await.unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups["5667854"], "Group Three");

        assert_eq!(service.all_groups().await.unwrap(), groups);
    }

    #[tokio::test]
    async fn test_all_groups_failure() {
        let mut gateway = MockGateway::new();
        gateway.expect_all_groups().times(1).returning(|| None);

        let service = service_with(gateway, Arc::new(InMemoryCache::new()));
        assert!(service.all_groups().await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_path_and_read() {
        let dir = TempDir::new().unwrap();
        let snapshot_config = SnapshotConfig {
            storage_root: dir.path().to_path_buf(),
            ..SnapshotConfig::default()
        };
        let service = WorkplaceService::new(
            Arc::new(MockGateway::new()),
            Arc::new(InMemoryCache::new()),
            CacheConfig::default(),
            snapshot_config,
        );

        let path = service.group_snapshot_path();
        assert_eq!(path, dir.path().join("Workplace").join("workplace-groups.txt"));
        assert!(service.read_group_snapshot().await.is_empty());

        let mut groups = GroupRecord::new();
        groups.insert("1234533".to_string(), "Group One".to_string());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, encode_snapshot(&groups).unwrap()).unwrap();
        assert_eq!(service.read_group_snapshot().await, groups);

        std::fs::write(&path, b"corrupt").unwrap();
        assert!(service.read_group_snapshot().await.is_empty());
    }
}

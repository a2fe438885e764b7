//! Gateway interface consumed by the service layer.

use async_trait::async_trait;
use workplace_core::CommentOrder;

/// Endpoint-level access to the remote API.
///
/// Every method returns the raw response body on success and `None` on any
/// failure; failures have already been classified and, where required,
/// logged by the implementation.
#[async_trait]
pub trait WorkplaceGateway: Send + Sync {
    /// Raw feed of a group.
    async fn posts_from_group(&self, group_id: &str, limit: Option<u32>) -> Option<String>;

    /// Raw listing of every group in the configured community.
    async fn all_groups(&self) -> Option<String>;

    /// Raw comments of a post.
    async fn post_comments(
        &self,
        post_id: &str,
        limit: Option<u32>,
        order: Option<CommentOrder>,
    ) -> Option<String>;

    /// Raw batched profile lookup. The returned array is positionally
    /// aligned with `users`.
    async fn profile_info(&self, users: &[String]) -> Option<String>;
}

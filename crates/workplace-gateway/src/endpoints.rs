//! Requests for the remote endpoints the integration consumes.

use crate::types::GatewayRequest;
use serde::{Deserialize, Serialize};
use workplace_core::{CommentOrder, WorkplaceResult};

/// Fields requested for every feed post.
pub const POST_FIELDS: &str =
    "permalink_url,message,description,formatting,created_time,type,from{name,picture,link}";

/// Fields requested for every group.
pub const GROUP_FIELDS: &str = "id,name";

/// Fields requested for every comment.
pub const COMMENT_FIELDS: &str = "id,created_time,message,from{name,picture,link},attachment";

/// `GET {group_id}/feed`
#[must_use]
pub fn group_feed(group_id: &str, limit: Option<u32>) -> GatewayRequest {
    GatewayRequest::get(format!("{}/feed", group_id))
        .operation("posts_from_group")
        .param("fields", POST_FIELDS)
        .param_opt("limit", limit.filter(|l| *l > 0))
}

/// `GET {community_id}/groups`
#[must_use]
pub fn community_groups(community_id: &str, limit: u32) -> GatewayRequest {
    GatewayRequest::get(format!("{}/groups", community_id))
        .operation("all_groups")
        .param("fields", GROUP_FIELDS)
        .param("limit", limit.to_string())
}

/// `GET {post_id}/comments`
#[must_use]
pub fn post_comments(
    post_id: &str,
    limit: Option<u32>,
    order: Option<CommentOrder>,
) -> GatewayRequest {
    GatewayRequest::get(format!("{}/comments", post_id))
        .operation("post_comments")
        .param("fields", COMMENT_FIELDS)
        .param_opt("limit", limit.filter(|l| *l > 0))
        .param_opt("order", order)
}

/// One entry of a batched call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSubRequest {
    pub method: String,
    pub relative_url: String,
}

/// One entry of a batched response.
///
/// Successful entries carry their body as a JSON document encoded in a
/// string; error entries may carry a plain object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchSubResponse {
    pub code: u16,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

impl BatchSubResponse {
    /// Decodes the body, unwrapping a string-encoded document.
    #[must_use]
    pub fn decoded_body(&self) -> Option<serde_json::Value> {
        match self.body.as_ref()? {
            serde_json::Value::String(raw) => serde_json::from_str(raw).ok(),
            serde_json::Value::Null => None,
            other => Some(other.clone()),
        }
    }
}

/// `POST ?batch=[...]`, one `GET {user}?fields={fields}` per user, in input order.
pub fn profile_batch<S: AsRef<str>>(users: &[S], fields: &str) -> WorkplaceResult<GatewayRequest> {
    let batch: Vec<BatchSubRequest> = users
        .iter()
        .map(|user| BatchSubRequest {
            method: "GET".to_string(),
            relative_url: format!("{}?fields={}", user.as_ref(), fields),
        })
        .collect();

    let encoded = serde_json::to_string(&batch)?;

    Ok(GatewayRequest::post("")
        .operation("profile_info")
        .param("batch", encoded))
}

//! Cache key generators.
//!
//! A key is `{prefix}:{sha256(operation-param-...)}`. Parameters are always
//! rendered in a fixed order, and an absent limit renders as `0`, so the
//! same call always maps to the same key.

use sha2::{Digest, Sha256};
use workplace_core::CommentOrder;

/// Default prefix namespacing every cache key.
pub const CACHE_PREFIX: &str = "workplace:cache";

/// Hex-encoded SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Derive a key from an operation name and its ordered parameters.
#[must_use]
pub fn derive(prefix: &str, operation: &str, params: &[&str]) -> String {
    let mut material = operation.to_string();
    for param in params {
        material.push('-');
        material.push_str(param);
    }
    format!("{}:{}", prefix, sha256_hex(material.as_bytes()))
}

#[must_use]
pub fn posts_from_group(prefix: &str, group_id: &str, limit: Option<u32>) -> String {
    let limit = limit.unwrap_or(0).to_string();
    derive(prefix, "posts_from_group", &[group_id, &limit])
}

#[must_use]
pub fn post_comments(
    prefix: &str,
    post_id: &str,
    limit: Option<u32>,
    order: CommentOrder,
) -> String {
    let limit = limit.unwrap_or(0).to_string();
    derive(prefix, "post_comments", &[post_id, &limit, order.as_str()])
}

#[must_use]
pub fn all_groups(prefix: &str) -> String {
    derive(prefix, "all_groups", &[])
}

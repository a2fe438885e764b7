//! Normalized records produced from raw Workplace payloads.
//!
//! Every string field is always present: anything missing from the source
//! JSON is stored as an empty string.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A group feed post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPost {
    pub id: String,
    /// Markup-free message text.
    pub message: String,
    /// Permalink to the post.
    pub link: String,
    pub author_name: String,
    pub author_picture_url: String,
    pub author_profile_link: String,
    pub created_time: String,
}

/// A comment on a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedComment {
    pub id: String,
    pub created_time: String,
    /// Markup-free message text, or a placeholder for attachment-only comments.
    pub message: String,
    pub author_name: String,
    pub author_picture_url: String,
    pub author_profile_link: String,
    pub author_id: String,
}

/// External group id mapped to the group display name, in listing order.
pub type GroupRecord = IndexMap<String, String>;

/// Caller key mapped to the raw decoded profile object.
pub type ProfileLookupResult<K> = BTreeMap<K, serde_json::Value>;

/// Ordering requested from the comments endpoint.
///
/// Both orderings are fetched and cached independently; nothing is re-sorted
/// locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentOrder {
    #[default]
    Chronological,
    ReverseChronological,
}

impl CommentOrder {
    /// Value sent as the `order` query parameter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chronological => "chronological",
            Self::ReverseChronological => "reverse_chronological",
        }
    }
}

impl fmt::Display for CommentOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chronological" => Ok(Self::Chronological),
            "reverse_chronological" => Ok(Self::ReverseChronological),
            other => Err(format!("Unknown comment order: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_order_round_trip() {
        for order in [CommentOrder::Chronological, CommentOrder::ReverseChronological] {
            assert_eq!(order.as_str().parse::<CommentOrder>().unwrap(), order);
        }
        assert!("newest".parse::<CommentOrder>().is_err());
    }

    #[test]
    fn test_comment_order_default() {
        assert_eq!(CommentOrder::default(), CommentOrder::Chronological);
    }

    #[test]
    fn test_records_default_to_empty_strings() {
        let post = NormalizedPost::default();
        assert!(post.message.is_empty());
        assert!(post.author_picture_url.is_empty());

        let comment = NormalizedComment::default();
        assert!(comment.author_id.is_empty());
    }
}

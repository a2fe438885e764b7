//! Mapping of raw Graph payloads onto fixed-shape records.
//!
//! Every function here is pure. Absent or non-scalar fields become empty
//! strings and message text is stripped of markup.

use scraper::Html;
use serde_json::Value;
use tracing::warn;
use workplace_core::{GroupRecord, NormalizedComment, NormalizedPost};

/// Returns the items of the top-level `data` array.
///
/// A body that is not JSON, or whose `data` is absent or not an array,
/// yields no items.
#[must_use]
pub fn data_items(body: &str) -> Vec<Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(mut root)) => match root.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        Ok(_) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "Response body is not valid JSON");
            Vec::new()
        }
    }
}

#[must_use]
pub fn normalize_post(item: &Value) -> NormalizedPost {
    let message = first_non_empty([
        text_at(item, &["message"]),
        text_at(item, &["description"]),
        attachment_placeholder(text_at(item, &["type"])),
    ]);

    NormalizedPost {
        id: text_at(item, &["id"]),
        message: strip_tags(&message),
        link: text_at(item, &["permalink_url"]),
        author_name: text_at(item, &["from", "name"]),
        author_picture_url: text_at(item, &["from", "picture", "data", "url"]),
        author_profile_link: text_at(item, &["from", "link"]),
        created_time: text_at(item, &["created_time"]),
    }
}

#[must_use]
pub fn normalize_comment(item: &Value) -> NormalizedComment {
    let attachment_type = match text_at(item, &["attachment", "type"]).as_str() {
        "video_inline" => "video".to_string(),
        other => other.to_string(),
    };
    let message = first_non_empty([
        text_at(item, &["message"]),
        attachment_placeholder(attachment_type),
    ]);

    NormalizedComment {
        id: text_at(item, &["id"]),
        created_time: text_at(item, &["created_time"]),
        message: strip_tags(&message),
        author_name: text_at(item, &["from", "name"]),
        author_picture_url: text_at(item, &["from", "picture", "data", "url"]),
        author_profile_link: text_at(item, &["from", "link"]),
        author_id: text_at(item, &["from", "id"]),
    }
}

/// Builds the id to name mapping. Items lacking either field are skipped.
#[must_use]
pub fn normalize_groups(items: &[Value]) -> GroupRecord {
    items
        .iter()
        .filter_map(|item| {
            let id = scalar_at(item, &["id"])?;
            let name = scalar_at(item, &["name"])?;
            Some((id, name))
        })
        .collect()
}

/// Removes markup, keeping the text between tags.
///
/// The input is parsed as an HTML fragment, so comments are dropped and
/// character references such as `&amp;` are decoded.
#[must_use]
pub fn strip_tags(input: &str) -> String {
    if !input.contains(['<', '&']) {
        return input.to_string();
    }

    Html::parse_fragment(input)
        .root_element()
        .text()
        .collect::<String>()
}

fn attachment_placeholder(kind: String) -> String {
    if kind.is_empty() {
        kind
    } else {
        format!("Check out this {}", kind)
    }
}

fn first_non_empty<const N: usize>(candidates: [String; N]) -> String {
    candidates
        .into_iter()
        .find(|c| !c.is_empty())
        .unwrap_or_default()
}

fn scalar_at(item: &Value, path: &[&str]) -> Option<String> {
    let mut current = item;
    for key in path {
        current = current.get(key)?;
    }
    match current {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn text_at(item: &Value, path: &[&str]) -> String {
    scalar_at(item, path).unwrap_or_default()
}

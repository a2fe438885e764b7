//! Serialized form of the group snapshot.
//!
//! The snapshot is a pretty-printed JSON object mapping group id to name.

use workplace_core::{GroupRecord, WorkplaceResult};

pub fn encode_snapshot(groups: &GroupRecord) -> WorkplaceResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(groups)?)
}

pub fn decode_snapshot(bytes: &[u8]) -> WorkplaceResult<GroupRecord> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_keeps_exact_mapping() {
        let mut groups = GroupRecord::new();
        groups.insert("1234533".to_string(), "Group One".to_string());
        groups.insert("3456673".to_string(), "Group \"Two\" / ünïcode".to_string());

        let bytes = encode_snapshot(&groups).unwrap();
        assert_eq!(decode_snapshot(&bytes).unwrap(), groups);
    }

    #[test]
    fn test_snapshot_keeps_listing_order() {
        let groups: GroupRecord = [("9000", "Zeta"), ("1000", "Alpha")]
            .into_iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();

        let decoded = decode_snapshot(&encode_snapshot(&groups).unwrap()).unwrap();
        let ids: Vec<&str> = decoded.keys().map(String::as_str).collect();
        assert_eq!(ids, ["9000", "1000"]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_snapshot(b"a:1:{i:0;s:3:\"php\";}").is_err());
        assert!(decode_snapshot(b"[\"not\", \"a\", \"map\"]").is_err());
    }
}

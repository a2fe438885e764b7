//! Batched profile lookups.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use workplace_core::ProfileLookupResult;
use workplace_gateway::{BatchSubResponse, WorkplaceGateway};

/// Resolves many external identities with a single batched call.
///
/// The batch is built by walking the input map once; the same walk is used
/// to read the answers back, so the i-th answer always belongs to the i-th
/// key.
#[derive(Clone)]
pub struct BatchProfileResolver {
    gateway: Arc<dyn WorkplaceGateway>,
}

impl BatchProfileResolver {
    #[must_use]
    pub fn new(gateway: Arc<dyn WorkplaceGateway>) -> Self {
        Self { gateway }
    }

    /// Looks up every identity in `users`.
    ///
    /// Returns `None` for empty input (without calling out), for a failed
    /// call, and for an empty or undecodable batch answer. Otherwise only
    /// keys whose sub-response had status 200 are present.
    pub async fn resolve<K>(&self, users: &BTreeMap<K, String>) -> Option<ProfileLookupResult<K>>
    where
        K: Ord + Clone + Send + Sync,
    {
        if users.is_empty() {
            return None;
        }

        let (keys, identities): (Vec<&K>, Vec<String>) =
            users.iter().map(|(k, v)| (k, v.clone())).unzip();

        let body = self.gateway.profile_info(&identities).await?;

        let entries: Vec<BatchSubResponse> = match serde_json::from_str(&body) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Batch response is not an array of sub-responses");
                return None;
            }
        };

        if entries.is_empty() {
            return None;
        }

        Some(correlate(&keys, &entries))
    }
}

/// Pairs the i-th key with the i-th sub-response, keeping 200s only.
pub fn correlate<K: Ord + Clone>(
    keys: &[&K],
    entries: &[BatchSubResponse],
) -> ProfileLookupResult<K> {
    if keys.len() != entries.len() {
        warn!(
            requested = keys.len(),
            answered = entries.len(),
            "Batch answer length differs from request"
        );
    }

    keys.iter()
        .zip(entries)
        .filter(|(_, entry)| entry.code == 200)
        .filter_map(|(key, entry)| match entry.decoded_body() {
            Some(profile) => Some(((*key).clone(), profile)),
            None => {
                debug!("Dropping successful sub-response without a decodable body");
                None
            }
        })
        .collect()
}

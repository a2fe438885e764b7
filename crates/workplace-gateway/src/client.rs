//! HTTP gateway to the Workplace Graph API.

use crate::endpoints;
use crate::gateway::WorkplaceGateway;
use crate::types::{GatewayMethod, GatewayOutcome, GatewayRequest, GatewayResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Proxy, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, trace};
use workplace_config::GatewayConfig;
use workplace_core::{CommentOrder, WorkplaceError, WorkplaceResult};

/// Graph error code for an identity that is not part of the community.
pub const NOT_FOUND_ERROR_CODE: i64 = 100;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: i64,
}

/// Authenticated HTTP client for the remote API.
///
/// Never returns an error from a call: failures are classified into
/// [`GatewayOutcome`] and logged once when they are not benign.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    community_id: String,
    group_limit: u32,
    profile_fields: String,
}

impl GatewayClient {
    /// Creates a new gateway client from configuration.
    ///
    /// The bearer token is attached to every request. A proxy is used for
    /// both http and https only when host and port are both configured.
    pub fn new(config: &GatewayConfig) -> WorkplaceResult<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.bearer_token))
            .map_err(|e| WorkplaceError::configuration(format!("Invalid bearer token: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let mut builder = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout());

        if let Some(proxy_url) = config.proxy_url() {
            debug!(proxy = %proxy_url, "Routing gateway calls through proxy");
            let proxy = Proxy::all(&proxy_url).map_err(|e| {
                WorkplaceError::configuration(format!("Invalid proxy {}: {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| WorkplaceError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config))
    }

    /// Creates a gateway client around an existing HTTP client.
    ///
    /// The client is expected to carry the authorization header already.
    pub fn with_client(client: Client, config: &GatewayConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            community_id: config.community_id.clone(),
            group_limit: config.group_limit,
            profile_fields: config.profile_return_fields.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issues a call and returns the body on success.
    pub async fn call(&self, request: &GatewayRequest) -> Option<String> {
        self.call_classified(request).await.into_body()
    }

    /// Issues a call named by a method string.
    ///
    /// Unsupported methods return `None` without touching the network.
    pub async fn call_method(
        &self,
        method: &str,
        path: &str,
        query: &[(String, String)],
    ) -> Option<String> {
        let Some(method) = GatewayMethod::parse(method) else {
            debug!(method, path, "Unsupported gateway method");
            return None;
        };

        let mut request = GatewayRequest::new(method, path);
        request.query = query.to_vec();
        self.call(&request).await
    }

    /// Issues a call and classifies the result.
    pub async fn call_classified(&self, request: &GatewayRequest) -> GatewayOutcome {
        let response = match self.send(request).await {
            Ok(response) => response,
            Err(err) => {
                log_failure(request, &err);
                return GatewayOutcome::Failed;
            }
        };

        classify(request, response)
    }

    async fn send(&self, request: &GatewayRequest) -> WorkplaceResult<GatewayResponse> {
        let url = self.url(&request.path);
        debug!(
            operation = request.operation,
            method = %request.method,
            path = %request.path,
            "Gateway call"
        );

        let builder = match request.method {
            GatewayMethod::Get => self.client.get(&url),
            GatewayMethod::Post => self.client.post(&url),
        };

        let response = builder
            .query(&request.query)
            .send()
            .await
            .map_err(|e| WorkplaceError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| WorkplaceError::Transport(format!("Failed to read body: {}", e)))?;

        Ok(GatewayResponse {
            status,
            body: Some(body).filter(|b| !b.is_empty()),
        })
    }
}

fn classify(request: &GatewayRequest, response: GatewayResponse) -> GatewayOutcome {
    if response.is_ok() {
        return GatewayOutcome::Success(response.body.unwrap_or_default());
    }

    let status = StatusCode::from_u16(response.status).ok();
    let is_client_error = status.is_some_and(|s| s.is_client_error());

    if is_client_error && is_not_found_body(response.body.as_deref()) {
        trace!(
            operation = request.operation,
            path = %request.path,
            "Remote entity not registered"
        );
        return GatewayOutcome::NotFound;
    }

    let description = status
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
        .to_string();
    let err = WorkplaceError::RemoteStatus {
        status: response.status,
        description,
    };
    log_failure(request, &err);
    GatewayOutcome::Failed
}

fn is_not_found_body(body: Option<&str>) -> bool {
    body.and_then(|b| serde_json::from_str::<ErrorEnvelope>(b).ok())
        .is_some_and(|envelope| envelope.error.code == NOT_FOUND_ERROR_CODE)
}

fn log_failure(request: &GatewayRequest, err: &WorkplaceError) {
    error!(
        operation = request.operation,
        method = %request.method,
        path = %request.path,
        query = ?request.query,
        code = err.error_code(),
        error = %err,
        "Workplace gateway call failed"
    );
}

#[async_trait]
impl WorkplaceGateway for GatewayClient {
    async fn posts_from_group(&self, group_id: &str, limit: Option<u32>) -> Option<String> {
        self.call(&endpoints::group_feed(group_id, limit)).await
    }

    async fn all_groups(&self) -> Option<String> {
        self.call(&endpoints::community_groups(&self.community_id, self.group_limit))
            .await
    }

    async fn post_comments(
        &self,
        post_id: &str,
        limit: Option<u32>,
        order: Option<CommentOrder>,
    ) -> Option<String> {
        self.call(&endpoints::post_comments(post_id, limit, order))
            .await
    }

    async fn profile_info(&self, users: &[String]) -> Option<String> {
        if users.is_empty() {
            return None;
        }

        match endpoints::profile_batch(users, &self.profile_fields) {
            Ok(request) => self.call(&request).await,
            Err(err) => {
                error!(operation = "profile_info", error = %err, "Failed to encode batch");
                None
            }
        }
    }
}

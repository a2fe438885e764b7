//! Request, response, and outcome types for gateway calls.

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP methods the remote API is called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GatewayMethod {
    Get,
    Post,
}

impl GatewayMethod {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }

    /// Parses a method name, case-insensitively.
    ///
    /// Anything other than GET or POST is unsupported and yields `None`.
    #[must_use]
    pub fn parse(method: &str) -> Option<Self> {
        match method.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            _ => None,
        }
    }
}

impl fmt::Display for GatewayMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single call against the remote API.
///
/// Query parameters keep their insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    /// Name used when the call is logged.
    pub operation: &'static str,
    pub method: GatewayMethod,
    /// Path relative to the configured base URL.
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl GatewayRequest {
    #[must_use]
    pub fn new(method: GatewayMethod, path: impl Into<String>) -> Self {
        Self {
            operation: "call",
            method,
            path: path.into(),
            query: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(GatewayMethod::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(GatewayMethod::Post, path)
    }

    /// Sets the operation name used in logs.
    #[must_use]
    pub const fn operation(mut self, operation: &'static str) -> Self {
        self.operation = operation;
        self
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Appends a query parameter when a value is present.
    #[must_use]
    pub fn param_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value.to_string()),
            None => self,
        }
    }

    /// Looks up a query parameter by name.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw answer of the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    /// `None` when there is no content to parse.
    pub body: Option<String>,
}

impl GatewayResponse {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Classified result of a gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// HTTP 200 with the raw body.
    Success(String),
    /// The remote entity is not registered (error code 100). Never logged.
    NotFound,
    /// Any other failure. Already logged when this is returned.
    Failed,
}

impl GatewayOutcome {
    /// Collapses the outcome to "body or nothing".
    #[must_use]
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Success(body) => Some(body),
            Self::NotFound | Self::Failed => None,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

//! Configuration loader with layered sources.

use crate::AppConfig;
use config::{Config, ConfigError, Environment, File, Map};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;
use workplace_core::{WorkplaceError, WorkplaceResult};

/// Prefix of structured environment overrides, e.g. `WORKPLACE__GATEWAY__BEARER_TOKEN`.
pub const ENV_PREFIX: &str = "WORKPLACE";

/// Variable selecting the environment-specific config file.
pub const ENVIRONMENT_VAR: &str = "WORKPLACE_ENVIRONMENT";

const LEGACY_BASE_URL: &str = "SS_WORKPLACE_GATEWAY_REST_URL";
const LEGACY_BEARER_TOKEN: &str = "SS_WORKPLACE_BEARER_TOKEN";
const LEGACY_COMMUNITY_ID: &str = "SS_WORKPLACE_COMMUNITY_ID";
const LEGACY_PROXY_HOST: &str = "SS_OUTBOUND_PROXY";
const LEGACY_PROXY_PORT: &str = "SS_OUTBOUND_PROXY_PORT";
const LEGACY_FEED_CACHE_LIFETIME: &str = "SS_WORKPLACE_HOMEPAGE_GATEWAY_CACHE_LIFETIME";

/// Shared handle to the loaded configuration.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with the `WORKPLACE__` prefix
    /// 5. Legacy flat `SS_*` variables
    pub fn new(config_dir: impl Into<String>) -> WorkplaceResult<Self> {
        let config_dir = config_dir.into();

        // Load .env file if present
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let config = Self::load_config(&config_dir, None)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> WorkplaceResult<Self> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Loads and validates configuration from `config_dir`.
    ///
    /// `vars` replaces the process environment when given.
    pub fn load_config(
        config_dir: &str,
        vars: Option<&Map<String, String>>,
    ) -> WorkplaceResult<AppConfig> {
        let lookup = |key: &str| match vars {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        };

        let environment = lookup(ENVIRONMENT_VAR).unwrap_or_else(|| "development".to_string());
        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        // Values stay strings until deserialization so ids keep their digits.
        let mut env_source = Environment::with_prefix(ENV_PREFIX).separator("__");
        if let Some(vars) = vars {
            env_source = env_source.source(Some(vars.clone()));
        }
        builder = builder.add_source(env_source);

        let config = builder.build().map_err(config_error)?;
        let mut app_config: AppConfig = config.try_deserialize().map_err(config_error)?;
        app_config.app.environment = environment;

        apply_legacy_overrides(&mut app_config, lookup)?;
        validate_config(&mut app_config)?;

        Ok(app_config)
    }
}

/// Applies the flat `SS_*` variables on top of the layered configuration.
fn apply_legacy_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> WorkplaceResult<()> {
    let gateway = &mut config.gateway;

    if let Some(url) = lookup(LEGACY_BASE_URL) {
        gateway.base_url = url;
    }
    if let Some(token) = lookup(LEGACY_BEARER_TOKEN) {
        gateway.bearer_token = token;
    }
    if let Some(community) = lookup(LEGACY_COMMUNITY_ID) {
        gateway.community_id = community;
    }
    if let Some(host) = lookup(LEGACY_PROXY_HOST) {
        gateway.proxy_host = Some(host).filter(|h| !h.trim().is_empty());
    }
    if let Some(port) = lookup(LEGACY_PROXY_PORT).filter(|p| !p.trim().is_empty()) {
        let port = port.trim().parse::<u16>().map_err(|e| {
            WorkplaceError::configuration(format!("{} is not a valid port: {}", LEGACY_PROXY_PORT, e))
        })?;
        gateway.proxy_port = Some(port);
    }
    if let Some(lifetime) = lookup(LEGACY_FEED_CACHE_LIFETIME).filter(|l| !l.trim().is_empty()) {
        config.cache.posts_feed_ttl_secs = lifetime.trim().parse::<u64>().map_err(|e| {
            WorkplaceError::configuration(format!(
                "{} is not a number of seconds: {}",
                LEGACY_FEED_CACHE_LIFETIME, e
            ))
        })?;
    }

    Ok(())
}

/// Validates the configuration.
///
/// A half-configured proxy is cleared so that requests go out directly.
pub fn validate_config(config: &mut AppConfig) -> WorkplaceResult<()> {
    let gateway = &mut config.gateway;

    if gateway.bearer_token.trim().is_empty() {
        return Err(WorkplaceError::configuration("Gateway bearer token is required"));
    }

    if gateway.community_id.trim().is_empty() {
        return Err(WorkplaceError::configuration("Gateway community id is required"));
    }

    match Url::parse(&gateway.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => {
            return Err(WorkplaceError::configuration(format!(
                "Gateway base URL must be http or https, got {}",
                url.scheme()
            )));
        }
        Err(e) => {
            return Err(WorkplaceError::configuration(format!(
                "Invalid gateway base URL {}: {}",
                gateway.base_url, e
            )));
        }
    }

    let host_set = gateway
        .proxy_host
        .as_deref()
        .is_some_and(|h| !h.trim().is_empty());
    if host_set != gateway.proxy_port.is_some() {
        warn!(
            proxy_host = ?gateway.proxy_host,
            proxy_port = ?gateway.proxy_port,
            "Outbound proxy needs both host and port; proxy disabled"
        );
        gateway.proxy_host = None;
        gateway.proxy_port = None;
    }

    if gateway.group_limit == 0 {
        return Err(WorkplaceError::configuration("Gateway group limit must be positive"));
    }

    if config.snapshot.reschedule_secs == 0 {
        return Err(WorkplaceError::configuration("Snapshot reschedule interval must be positive"));
    }

    Ok(())
}

fn config_error(err: ConfigError) -> WorkplaceError {
    WorkplaceError::Configuration(err.to_string())
}

//! Server startup utilities.

use tracing::info;
use workplace_config::AppConfig;

/// Prints the startup banner.
pub fn print_banner() {
    info!(
        r#"
 _      __         __        __
| | /| / /__  ____/ /__ ___  / /__ ________
| |/ |/ / _ \/ __/  '_// _ \/ / _ `/ __/ -_)
|__/|__/\___/_/ /_/\_\/ .__/_/\_,_/\__/\__/
                     /_/   integration
    "#
    );
}

/// Backend names and paths the service runs with.
pub fn startup_summary(config: &AppConfig) -> Vec<(&'static str, String)> {
    let cache = if config.cache.enabled {
        format!("redis ({})", config.cache.key_prefix)
    } else {
        "in-memory".to_string()
    };
    let queue = if config.jobs.redis_enabled {
        format!("redis ({}:{})", config.jobs.key_prefix, config.jobs.queue)
    } else {
        format!("in-memory ({})", config.jobs.queue)
    };
    let proxy = config
        .gateway
        .proxy_url()
        .unwrap_or_else(|| "none".to_string());

    vec![
        ("Gateway", config.gateway.base_url.clone()),
        ("Community", config.gateway.community_id.clone()),
        ("Proxy", proxy),
        ("Cache", cache),
        ("Job queue", queue),
        ("Snapshot", config.snapshot.file_path().display().to_string()),
        (
            "Reschedule",
            format!("{}s", config.snapshot.reschedule_secs),
        ),
    ]
}

/// Prints startup information.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    for (label, value) in startup_summary(config) {
        info!("{:<11} {}", format!("{}:", label), value);
    }
    info!("{}", separator);
}

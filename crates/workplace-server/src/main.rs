//! # Workplace Server
//!
//! Loads configuration, wires the gateway, cache and service, and runs the
//! group snapshot job until Ctrl+C or SIGTERM.

use anyhow::Context;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use workplace_config::ConfigLoader;
use workplace_core::telemetry::init_logging;
use workplace_jobs::{create_pool, InMemoryJobQueue, RedisJobQueue};
use workplace_server::app::App;
use workplace_server::startup::{print_banner, print_startup_info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loader = ConfigLoader::from_default_location().context("Failed to load configuration")?;
    let config = loader.get().await;

    init_logging(&config.logging)?;

    print_banner();
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);
    print_startup_info(&config);

    let app = App::build(config.clone()).context("Failed to build application")?;

    if config.jobs.redis_enabled {
        let pool = create_pool(&config.jobs)
            .await
            .context("Failed to connect to the job queue")?;
        let queue = Arc::new(RedisJobQueue::new(pool, &config.jobs));
        app.run(queue, shutdown_signal()).await?;
    } else {
        app.run(Arc::new(InMemoryJobQueue::new()), shutdown_signal())
            .await?;
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}

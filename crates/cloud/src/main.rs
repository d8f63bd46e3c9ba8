//! Gantry cloud catalogue binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use gantry_cloud::runtime::{spawn_queue_ticker, spawn_repair_scanner};
use gantry_cloud::{AppState, create_router};
use gantry_core::config::CloudConfig;
use gantry_core::{Clock, SystemClock};
use gantry_queue::InMemoryQueue;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Gantry - media vault sync, cloud catalogue
#[derive(Parser, Debug)]
#[command(name = "gantry-cloudd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "GANTRY_CLOUD_CONFIG", default_value = "config/cloud.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Gantry cloud v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration: optional TOML file, overridable via environment.
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let config: CloudConfig = figment
        .merge(Env::prefixed("GANTRY_CLOUD_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialise the catalogue store and verify it before accepting work.
    let catalog = gantry_catalog::from_config(&config.catalog)
        .await
        .context("failed to initialize catalog store")?;
    catalog
        .health_check()
        .await
        .context("catalog health check failed")?;
    tracing::info!("Catalog store initialized");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let queue = Arc::new(InMemoryQueue::new(clock.clone()));

    let state = AppState::new(config.clone(), catalog, queue.clone(), clock);
    state
        .subscribe_consumers()
        .await
        .map_err(|e| anyhow::anyhow!("failed to subscribe consumers: {e}"))?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    let ticker = spawn_queue_ticker(
        queue.clone(),
        config.sync.queue_tick_interval(),
        shutdown.clone(),
    );
    let scanner = spawn_repair_scanner(
        Arc::new(state.consistency_worker()),
        config.sync.scan_interval(),
        shutdown.clone(),
    );

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind to {}", config.server.bind))?;
    tracing::info!("Listening on {}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await?;

    // Bounded drain: stranded messages are recovered by the next start's
    // reconciliation pass.
    let grace = config.sync.shutdown_grace();
    if tokio::time::timeout(grace, async {
        let _ = ticker.await;
        let _ = scanner.await;
    })
    .await
    .is_err()
    {
        tracing::warn!("pipeline loops did not stop within the grace period");
    }

    tracing::info!("shutdown complete");
    Ok(())
}

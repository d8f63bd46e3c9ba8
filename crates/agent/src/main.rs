//! Gantry on-prem agent binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use gantry_agent::consumers::{AlbumManifestUploadConsumer, SyncUserConsumer, VideoUploadConsumer};
use gantry_agent::{
    CloudClient, FileVaultRegistry, HttpCloudClient, HttpVideoSender, ReceiverState, VaultRegistry,
    VideoSender, create_receiver_router,
};
use gantry_core::config::AgentConfig;
use gantry_core::messages::{TOPIC_ALBUM_MANIFEST_UPLOAD, TOPIC_USER_SYNC, TOPIC_VIDEO_UPLOAD};
use gantry_core::{Clock, SystemClock};
use gantry_queue::{InMemoryQueue, Queue, spawn_queue_ticker};
use gantry_staging::{FilesystemStaging, StagingStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Gantry - media vault sync, on-prem agent
#[derive(Parser, Debug)]
#[command(name = "gantry-agentd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "GANTRY_AGENT_CONFIG", default_value = "config/agent.toml")]
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

    tracing::info!("Gantry agent v{}", env!("CARGO_PKG_VERSION"));

    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let config: AgentConfig = figment
        .merge(Env::prefixed("GANTRY_AGENT_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    let staging: Arc<dyn StagingStore> = Arc::new(
        FilesystemStaging::new(&config.staging_dir)
            .await
            .context("failed to initialize staging store")?,
    );
    tracing::info!(staging_dir = %config.staging_dir.display(), "Staging store initialized");

    let cloud: Arc<dyn CloudClient> = Arc::new(HttpCloudClient::new(config.cloud_base_url.clone()));

    // The vault pushes payloads back to this agent's receiver; the registry
    // resolves per-database handles lazily on first use.
    let sender: Arc<dyn VideoSender> = Arc::new(HttpVideoSender::new(
        config.effective_receiver_url(),
        config.provider_id.clone(),
    ));
    let vaults: Arc<dyn VaultRegistry> =
        Arc::new(FileVaultRegistry::new(&config.vault_config_path, sender));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let queue = Arc::new(InMemoryQueue::new(clock));

    let provider_id = config.provider_id.clone();
    let max_retries = config.sync.max_retries;

    queue
        .subscribe(
            &format!("onprem:{provider_id}:usersync"),
            TOPIC_USER_SYNC,
            &provider_id,
            Arc::new(SyncUserConsumer::new(
                provider_id.clone(),
                vaults.clone(),
                cloud.clone(),
                max_retries,
            )),
        )
        .await
        .map_err(|e| anyhow::anyhow!("failed to subscribe usersync: {e}"))?;
    queue
        .subscribe(
            &format!("onprem:{provider_id}:albummanifestupload"),
            TOPIC_ALBUM_MANIFEST_UPLOAD,
            &provider_id,
            Arc::new(AlbumManifestUploadConsumer::new(
                provider_id.clone(),
                vaults.clone(),
                cloud.clone(),
                max_retries,
            )),
        )
        .await
        .map_err(|e| anyhow::anyhow!("failed to subscribe albummanifestupload: {e}"))?;
    queue
        .subscribe(
            &format!("onprem:{provider_id}:videoupload"),
            TOPIC_VIDEO_UPLOAD,
            &provider_id,
            Arc::new(VideoUploadConsumer::new(vaults.clone())),
        )
        .await
        .map_err(|e| anyhow::anyhow!("failed to subscribe videoupload: {e}"))?;

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

    let receiver_state = ReceiverState::new(staging, cloud, vaults, max_retries);
    let app = create_receiver_router(receiver_state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind to {}", config.server.bind))?;
    tracing::info!("Receiver listening on {}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await?;

    let grace = config.sync.shutdown_grace();
    if tokio::time::timeout(grace, async {
        let _ = ticker.await;
    })
    .await
    .is_err()
    {
        tracing::warn!("queue ticker did not stop within the grace period");
    }

    tracing::info!("shutdown complete");
    Ok(())
}

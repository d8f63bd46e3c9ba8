//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// HTTP server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_cloud_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_cloud_bind(),
        }
    }
}

fn default_cloud_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_agent_bind() -> String {
    "127.0.0.1:8081".to_string()
}

/// Catalogue repository backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogConfig {
    /// In-memory repositories (testing and single-process demos).
    Memory,
    /// SQLite database via sqlx.
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::Memory
    }
}

/// Pipeline scheduling configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Interval between queue ticks, in milliseconds.
    #[serde(default = "default_queue_tick_interval_ms")]
    pub queue_tick_interval_ms: u64,
    /// Interval between repair scans, in milliseconds.
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
    /// In-handler attempts for outbound cloud calls.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Bounded shutdown grace period, in seconds.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

fn default_queue_tick_interval_ms() -> u64 {
    100
}

fn default_scan_interval_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    crate::DEFAULT_MAX_RETRIES
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            queue_tick_interval_ms: default_queue_tick_interval_ms(),
            scan_interval_ms: default_scan_interval_ms(),
            max_retries: default_max_retries(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl SyncConfig {
    pub fn queue_tick_interval(&self) -> Duration {
        Duration::from_millis(self.queue_tick_interval_ms)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Validate scheduling invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_tick_interval_ms == 0 {
            return Err(
                "sync.queue_tick_interval_ms cannot be 0; the tick timer would spin".to_string(),
            );
        }
        if self.scan_interval_ms == 0 {
            return Err("sync.scan_interval_ms cannot be 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("sync.max_retries must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Complete cloud catalogue configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl CloudConfig {
    /// Create a test configuration: in-memory catalogue, default intervals.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), String> {
        self.sync.validate()
    }
}

/// Complete on-prem agent configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Receiver bind address.
    #[serde(default = "default_agent_server")]
    pub server: ServerConfig,
    /// Tenant this agent serves. Required.
    pub provider_id: String,
    /// Path to the vault topology JSON.
    #[serde(default = "default_vault_config_path")]
    pub vault_config_path: PathBuf,
    /// Durable staging directory for in-flight payloads.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
    /// Base URL of the cloud catalogue API.
    #[serde(default = "default_cloud_base_url")]
    pub cloud_base_url: String,
    /// URL the vault pushes payloads to. Defaults to this agent's own bind.
    #[serde(default)]
    pub receiver_url: Option<String>,
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_agent_server() -> ServerConfig {
    ServerConfig {
        bind: default_agent_bind(),
    }
}

fn default_vault_config_path() -> PathBuf {
    PathBuf::from("mediavault_config.json")
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("./data/staging")
}

fn default_cloud_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.provider_id.is_empty() {
            return Err("agent config requires a non-empty provider_id".to_string());
        }
        self.sync.validate()
    }

    /// The URL the vault should push payloads to.
    pub fn effective_receiver_url(&self) -> String {
        match &self.receiver_url {
            Some(url) => url.clone(),
            None => format!("http://{}", self.server.bind),
        }
    }
}

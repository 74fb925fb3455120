//! Adlens reconciliation and classification engine.
//!
//! Seller advertising accounts authenticate against an external ad platform
//! with per-account session cookies. This crate mirrors their daily
//! performance metrics into ClickHouse, detects and back-fills missing days,
//! labels session health, and classifies campaigns into BCG quadrants.
//!
//! The engine owns no wire format; an out-of-scope HTTP layer consumes
//! [`SyncEngine`] directly.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use recon_engine::{BatchReportLog, Refresher, SyncQueue, SyncWorker, Synchronizer};
use telemetry::health;

pub use engine_core::{
    classify_campaigns, classify_campaigns_with, default_range, Account, BcgQuadrant, Campaign,
    CampaignState, Clock, DailyAggregate, DateRange, Error, FixedClock, GrowthStrategy,
    HealthLabel, MetricsSummary, Result, SessionHealth, StoredStatus, SystemClock,
};
pub use metrics_store::{AccountRegistry, MetricsStore, StoreClient, StoreConfig};
pub use platform_client::{AdsPlatform, PlatformClient, PlatformConfig};
pub use recon_engine::{
    AccountOutcome, AccountReport, BatchReport, RefreshResult, SyncView, WorkerConfig,
};
pub use telemetry::{init_tracing, init_tracing_from_env};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub worker: WorkerSettings,

    /// Length of the default request window, ending yesterday.
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,
}

fn default_window_days() -> u32 {
    7
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            platform: PlatformConfig::default(),
            worker: WorkerSettings::default(),
            default_window_days: default_window_days(),
        }
    }
}

/// Serializable worker settings; durations are carried as integers so they
/// round-trip through TOML and environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSettings {
    #[serde(default = "default_inter_account_delay_ms")]
    pub inter_account_delay_ms: u64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_report_history")]
    pub report_history: usize,
}

fn default_inter_account_delay_ms() -> u64 {
    1000
}

fn default_queue_capacity() -> usize {
    64
}

fn default_report_history() -> usize {
    32
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            inter_account_delay_ms: default_inter_account_delay_ms(),
            queue_capacity: default_queue_capacity(),
            report_history: default_report_history(),
        }
    }
}

impl From<&WorkerSettings> for WorkerConfig {
    fn from(s: &WorkerSettings) -> Self {
        Self {
            inter_account_delay: Duration::from_millis(s.inter_account_delay_ms),
            queue_capacity: s.queue_capacity,
            report_history: s.report_history,
        }
    }
}

/// Load configuration from defaults, `config/default.toml`, and the
/// environment (prefix `ADLENS`, `__` separator).
pub fn load_config() -> Result<Config> {
    dotenvy::dotenv().ok();

    let config = config::Config::builder()
        .add_source(
            config::Config::try_from(&Config::default())
                .map_err(|e| Error::config(format!("Default config error: {e}")))?,
        )
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("ADLENS")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| Error::config(format!("Failed to build configuration: {e}")))?;

    let mut config: Config = config
        .try_deserialize()
        .map_err(|e| Error::config(format!("Failed to deserialize configuration: {e}")))?;

    // Manual overrides for nested config; the config crate's nested env
    // parsing is unreliable with underscored field names.
    if let Ok(url) = std::env::var("ADLENS_STORE_URL") {
        config.store.url = url;
    }
    if let Ok(database) = std::env::var("ADLENS_STORE_DATABASE") {
        config.store.database = database;
    }
    if let Ok(username) = std::env::var("ADLENS_STORE_USERNAME") {
        config.store.username = Some(username);
    }
    if let Ok(password) = std::env::var("ADLENS_STORE_PASSWORD") {
        config.store.password = Some(password);
    }
    if let Ok(base_url) = std::env::var("ADLENS_PLATFORM_BASE_URL") {
        config.platform.base_url = base_url;
    }

    Ok(config)
}

/// The wired engine: Phase-1 synchronizer, Phase-2 worker, manual refresher.
pub struct SyncEngine {
    synchronizer: Synchronizer,
    refresher: Refresher,
    reports: Arc<BatchReportLog>,
    clock: Arc<dyn Clock>,
    default_window_days: u32,
    queue: SyncQueue,
    worker_handle: Option<tokio::task::JoinHandle<()>>,
}

impl SyncEngine {
    /// Connect to the real store and platform, initialize the schema, run
    /// startup health checks, and start the background worker.
    pub async fn connect(config: Config) -> Result<Self> {
        let store_client = StoreClient::new(config.store.clone())?;

        if let Err(e) = metrics_store::health::init_schema(&store_client).await {
            // Schema may already exist under a user without DDL rights.
            error!("Failed to initialize store schema: {}", e);
        }

        if metrics_store::health::check_connection(&store_client).await {
            health().store.set_healthy();
            info!("Store connection: healthy");
        } else {
            health().store.set_unhealthy("Connection failed");
            error!("Store connection: unhealthy");
        }

        let platform = PlatformClient::new(config.platform.clone())?;
        health().platform.set_healthy();

        let store: Arc<dyn MetricsStore> = Arc::new(store_client.clone());
        let registry: Arc<dyn AccountRegistry> = Arc::new(store_client.clone());
        let read_timeout = Duration::from_secs(store_client.config().read_timeout_secs);

        Ok(Self::wire(
            registry,
            store,
            Arc::new(platform),
            Arc::new(SystemClock),
            (&config.worker).into(),
            read_timeout,
            config.default_window_days,
        ))
    }

    /// Wire the engine from explicit components. This is the seam tests use
    /// to substitute in-memory stores and a scripted platform.
    pub fn with_components(
        registry: Arc<dyn AccountRegistry>,
        store: Arc<dyn MetricsStore>,
        platform: Arc<dyn AdsPlatform>,
        clock: Arc<dyn Clock>,
        worker_config: WorkerConfig,
    ) -> Self {
        Self::wire(
            registry,
            store,
            platform,
            clock,
            worker_config,
            Duration::from_secs(5),
            default_window_days(),
        )
    }

    fn wire(
        registry: Arc<dyn AccountRegistry>,
        store: Arc<dyn MetricsStore>,
        platform: Arc<dyn AdsPlatform>,
        clock: Arc<dyn Clock>,
        worker_config: WorkerConfig,
        read_timeout: Duration,
        default_window_days: u32,
    ) -> Self {
        let (worker, queue, reports) = SyncWorker::new(
            platform.clone(),
            store.clone(),
            registry.clone(),
            clock.clone(),
            worker_config,
        );
        let worker_handle = worker.start();

        let synchronizer =
            Synchronizer::new(registry.clone(), store.clone(), queue.clone(), read_timeout);
        let refresher = Refresher::new(registry, store, platform, clock.clone());

        Self {
            synchronizer,
            refresher,
            reports,
            clock,
            default_window_days,
            queue,
            worker_handle: Some(worker_handle),
        }
    }

    /// Phase 1 + Phase-2 dispatch for a set of accounts.
    pub async fn synchronize(
        &self,
        account_ids: &[String],
        range: DateRange,
    ) -> Result<SyncView> {
        self.synchronizer.synchronize(account_ids, range).await
    }

    /// Synchronize over the configured default window, ending yesterday.
    pub async fn synchronize_default_window(&self, account_ids: &[String]) -> Result<SyncView> {
        let range = engine_core::default_range(self.clock.as_ref(), self.default_window_days);
        self.synchronize(account_ids, range).await
    }

    /// Synchronous single-account repair.
    pub async fn refresh_one(&self, account_id: &str, range: DateRange) -> Result<RefreshResult> {
        self.refresher.refresh_one(account_id, range).await
    }

    /// Recent Phase-2 batch reports, oldest first.
    pub fn batch_reports(&self) -> Vec<BatchReport> {
        self.reports.recent()
    }

    /// Stop the background worker: close the queue and wait for the current
    /// batch to finish.
    pub async fn shutdown(self) {
        // The synchronizer holds the other queue handle; both must drop
        // before the worker's receive loop ends.
        let Self {
            synchronizer,
            refresher,
            queue,
            worker_handle,
            ..
        } = self;
        drop(synchronizer);
        drop(refresher);
        drop(queue);

        if let Some(handle) = worker_handle {
            if let Err(e) = handle.await {
                error!("Sync worker task failed: {}", e);
            }
        }
        info!("Engine shutdown complete");
    }
}

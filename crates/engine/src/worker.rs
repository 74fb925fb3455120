//! Phase-2 background repair worker.
//!
//! A single task consumes batches from an mpsc channel and processes the
//! accounts of each batch **sequentially**: the platform rate-limits per
//! credential and per IP, so the fixed inter-account delay is deliberate
//! backpressure, not an oversight. One account's failure never aborts the
//! batch; every account produces a structured outcome collected into a
//! retained batch report.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use engine_core::{Account, Clock, DailyAggregate, DateRange, StoredStatus};
use metrics_store::{AccountRegistry, MetricsStore};
use platform_client::{AdsPlatform, ReportPayload};
use telemetry::metrics;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Pause between per-account platform calls within a batch.
    pub inter_account_delay: Duration,
    /// Capacity of the batch queue; enqueue beyond it drops the batch.
    pub queue_capacity: usize,
    /// How many finished batch reports to retain in memory.
    pub report_history: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            inter_account_delay: Duration::from_secs(1),
            queue_capacity: 64,
            report_history: 32,
        }
    }
}

/// One unit of background repair work: a set of accounts and the range to
/// reconcile for them. Accounts are processed in the order given.
#[derive(Debug, Clone)]
pub struct SyncBatch {
    pub accounts: Vec<Account>,
    pub range: DateRange,
}

/// Outcome of one account within one batch.
#[derive(Debug, Clone, Serialize)]
pub struct AccountOutcome {
    pub account_id: String,
    pub days_written: usize,
    pub error: Option<String>,
    pub credential_failure: bool,
}

impl AccountOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Structured record of one processed batch. Replaces log-scraping as the
/// way to observe background failures.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub range: DateRange,
    pub outcomes: Vec<AccountOutcome>,
}

impl BatchReport {
    pub fn failed_accounts(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded()).count()
    }
}

/// Bounded in-memory ring of recent batch reports.
#[derive(Debug)]
pub struct BatchReportLog {
    reports: Mutex<VecDeque<BatchReport>>,
    capacity: usize,
}

impl BatchReportLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            reports: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn push(&self, report: BatchReport) {
        let mut reports = self.reports.lock();
        if reports.len() == self.capacity {
            reports.pop_front();
        }
        reports.push_back(report);
    }

    /// Recent reports, oldest first.
    pub fn recent(&self) -> Vec<BatchReport> {
        self.reports.lock().iter().cloned().collect()
    }
}

/// Handle for enqueueing repair work. Cheap to clone; dropping every handle
/// closes the queue and stops the worker.
#[derive(Clone)]
pub struct SyncQueue {
    tx: mpsc::Sender<SyncBatch>,
}

impl SyncQueue {
    /// Fire-and-forget enqueue. A full or closed queue drops the batch with
    /// a warning; the Phase-1 caller is never blocked or failed by the
    /// repair path.
    pub fn enqueue(&self, batch: SyncBatch) {
        let accounts = batch.accounts.len();
        match self.tx.try_send(batch) {
            Ok(()) => {
                metrics().batches_enqueued.inc();
                metrics().queue_depth.inc();
                debug!(accounts = accounts, "Enqueued sync batch");
            }
            Err(e) => {
                metrics().batches_dropped.inc();
                warn!(accounts = accounts, error = %e, "Dropped sync batch");
            }
        }
    }
}

/// Background worker that repairs gaps by calling the platform and upserting
/// the result.
pub struct SyncWorker {
    platform: Arc<dyn AdsPlatform>,
    store: Arc<dyn MetricsStore>,
    registry: Arc<dyn AccountRegistry>,
    clock: Arc<dyn Clock>,
    config: WorkerConfig,
    reports: Arc<BatchReportLog>,
    rx: mpsc::Receiver<SyncBatch>,
}

impl SyncWorker {
    /// Build a worker plus the queue handle and report log it serves.
    pub fn new(
        platform: Arc<dyn AdsPlatform>,
        store: Arc<dyn MetricsStore>,
        registry: Arc<dyn AccountRegistry>,
        clock: Arc<dyn Clock>,
        config: WorkerConfig,
    ) -> (Self, SyncQueue, Arc<BatchReportLog>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let reports = Arc::new(BatchReportLog::new(config.report_history));

        let worker = Self {
            platform,
            store,
            registry,
            clock,
            config,
            reports: reports.clone(),
            rx,
        };

        (worker, SyncQueue { tx }, reports)
    }

    /// Spawn the run loop.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Main run loop; exits when every queue handle is dropped.
    async fn run(mut self) {
        info!(
            delay_ms = %self.config.inter_account_delay.as_millis(),
            "Sync worker starting"
        );

        while let Some(batch) = self.rx.recv().await {
            metrics().queue_depth.dec();
            let report = self.process_batch(batch).await;

            metrics().batches_processed.inc();
            info!(
                accounts = report.outcomes.len(),
                failed = report.failed_accounts(),
                range = %report.range,
                "Processed sync batch"
            );
            self.reports.push(report);
        }

        info!("Sync queue closed, worker stopping");
    }

    /// Process one batch: accounts sequentially, in the caller's order, with
    /// the configured delay between platform calls.
    async fn process_batch(&self, batch: SyncBatch) -> BatchReport {
        let started_at = self.clock.now();
        let mut outcomes = Vec::with_capacity(batch.accounts.len());

        for (i, account) in batch.accounts.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.inter_account_delay).await;
            }

            let outcome = self.sync_account(account, batch.range).await;
            if outcome.succeeded() {
                metrics().accounts_synced.inc();
            } else {
                metrics().accounts_failed.inc();
                error!(
                    account_id = %outcome.account_id,
                    error = outcome.error.as_deref().unwrap_or(""),
                    credential_failure = outcome.credential_failure,
                    "Account sync failed"
                );
            }
            outcomes.push(outcome);
        }

        BatchReport {
            started_at,
            finished_at: self.clock.now(),
            range: batch.range,
            outcomes,
        }
    }

    /// Repair one account: fetch the range, upsert at the granularity the
    /// payload provides, and reflect the call's outcome in the registry so
    /// the next Phase-1 health read matches reality.
    async fn sync_account(&self, account: &Account, range: DateRange) -> AccountOutcome {
        let mut outcome = AccountOutcome {
            account_id: account.account_id.clone(),
            days_written: 0,
            error: None,
            credential_failure: false,
        };

        let payload = match self
            .platform
            .fetch_range(&account.credential, &account.account_id, range)
            .await
        {
            Ok(payload) => payload,
            Err(e) => {
                outcome.credential_failure = e.is_credential_failure();
                outcome.error = Some(e.to_string());
                if outcome.credential_failure {
                    self.mark_status(&account.account_id, StoredStatus::Inactive, None)
                        .await;
                }
                return outcome;
            }
        };

        let rows = self.rows_for_payload(&account.account_id, range, payload);

        if !rows.is_empty() {
            match self.store.upsert_days(&rows).await {
                Ok(count) => outcome.days_written = count,
                Err(e) => {
                    outcome.error = Some(e.to_string());
                    return outcome;
                }
            }
        }

        self.mark_status(
            &account.account_id,
            StoredStatus::Active,
            Some(self.clock.now()),
        )
        .await;

        outcome
    }

    /// Turn a resolved payload into store rows, at the coarsest granularity
    /// the response provides. Aggregate-only payloads are written only when
    /// the range is a single day; per-day splits are never fabricated.
    fn rows_for_payload(
        &self,
        account_id: &str,
        range: DateRange,
        payload: ReportPayload,
    ) -> Vec<DailyAggregate> {
        match payload {
            ReportPayload::Daily(days) => days
                .into_iter()
                .filter(|day| range.contains(day.date))
                .collect(),
            ReportPayload::Aggregate(totals) if range.len_days() == 1 => {
                vec![totals.into_daily(account_id, range.start())]
            }
            ReportPayload::Aggregate(_) => {
                debug!(
                    account_id = account_id,
                    range = %range,
                    "Aggregate-only payload over multi-day range, writing no day rows"
                );
                Vec::new()
            }
            ReportPayload::Empty => Vec::new(),
        }
    }

    /// Registry status writes are best-effort: a failed write leaves the
    /// status stale until the next pass, which is tolerable.
    async fn mark_status(
        &self,
        account_id: &str,
        status: StoredStatus,
        last_sync_at: Option<DateTime<Utc>>,
    ) {
        if let Err(e) = self
            .registry
            .update_status(account_id, status, last_sync_at)
            .await
        {
            warn!(
                account_id = account_id,
                status = status.as_str(),
                error = %e,
                "Failed to update account status"
            );
        }
    }
}

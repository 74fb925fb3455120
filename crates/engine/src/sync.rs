//! Phase-1 reconciliation: the synchronous, availability-first read path.
//!
//! One call answers "what do we have, what is missing, and how healthy is
//! each session" for a set of accounts, using only the local store and
//! registry. The external platform is never contacted here; accounts with a
//! usable session and reported state are handed to the background worker as
//! a single batch, fire and forget.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use engine_core::{
    Account, DateRange, Error, HealthLabel, MetricsSummary, Result, SessionHealth,
};
use metrics_store::{AccountRegistry, MetricsStore};
use telemetry::metrics;

use crate::gaps::missing_dates;
use crate::worker::{SyncBatch, SyncQueue};

/// Per-account slice of a synchronization response.
#[derive(Debug, Clone, Serialize)]
pub struct AccountReport {
    pub account_id: String,
    pub summary: MetricsSummary,
    pub missing_dates: Vec<NaiveDate>,
    /// `None` for deleted accounts.
    pub health: Option<SessionHealth>,
    pub label: HealthLabel,
}

/// Everything Phase-1 produces, ordered like the caller's account list.
#[derive(Debug, Clone, Serialize)]
pub struct SyncView {
    pub range: DateRange,
    pub accounts: Vec<AccountReport>,
}

/// The Phase-1 driver.
pub struct Synchronizer {
    registry: Arc<dyn AccountRegistry>,
    store: Arc<dyn MetricsStore>,
    queue: SyncQueue,
    store_read_timeout: Duration,
}

impl Synchronizer {
    pub fn new(
        registry: Arc<dyn AccountRegistry>,
        store: Arc<dyn MetricsStore>,
        queue: SyncQueue,
        store_read_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            queue,
            store_read_timeout,
        }
    }

    /// Answer from local state for every requested account and enqueue one
    /// repair batch for the eligible ones.
    ///
    /// The registry read is the only fatal dependency. Store reads degrade
    /// per account: a failed or slow read yields a zero summary and no gaps
    /// for that account instead of failing the call.
    pub async fn synchronize(&self, account_ids: &[String], range: DateRange) -> Result<SyncView> {
        metrics().sync_requests.inc();

        let accounts = self.registry.get_accounts(account_ids).await.map_err(|e| {
            Error::StoreUnavailable(format!("account registry read failed: {e}"))
        })?;

        // Respond in the caller's order; unknown ids are skipped silently.
        let mut by_id: HashMap<&str, &Account> = accounts
            .iter()
            .map(|a| (a.account_id.as_str(), a))
            .collect();

        let mut reports = Vec::with_capacity(account_ids.len());
        let mut eligible = Vec::new();

        for account_id in account_ids {
            let Some(account) = by_id.remove(account_id.as_str()) else {
                warn!(account_id = %account_id, "Requested account not in registry, skipping");
                continue;
            };

            let report = self.report_for(account, range).await;
            let health = report.health;
            reports.push(report);

            // Deleted and dead sessions never reach the worker. Accounts
            // with full coverage still do; the worker's upsert refreshes
            // same-day rows that are stale rather than absent.
            if health.is_some_and(|h| h.sync_eligible()) {
                eligible.push(account.clone());
            }
        }

        metrics().accounts_reported.inc_by(reports.len() as u64);
        info!(
            requested = account_ids.len(),
            reported = reports.len(),
            eligible = eligible.len(),
            range = %range,
            "Synchronization view built"
        );

        if !eligible.is_empty() {
            self.queue.enqueue(SyncBatch {
                accounts: eligible,
                range,
            });
        }

        Ok(SyncView {
            range,
            accounts: reports,
        })
    }

    /// Build one account's report; store failure degrades to a zero summary.
    async fn report_for(&self, account: &Account, range: DateRange) -> AccountReport {
        let read = tokio::time::timeout(
            self.store_read_timeout,
            self.store.query_range(&account.account_id, range),
        )
        .await;

        let (summary, missing) = match read {
            Ok(Ok(rows)) => {
                let stored: BTreeSet<NaiveDate> = rows.iter().map(|r| r.date).collect();
                let missing = missing_dates(range, &stored);
                metrics().gaps_detected.inc_by(missing.len() as u64);
                (MetricsSummary::from_rows(&rows), missing)
            }
            Ok(Err(e)) => {
                metrics().degraded_accounts.inc();
                warn!(
                    account_id = %account.account_id,
                    error = %e,
                    "Store read failed, reporting zero summary"
                );
                (MetricsSummary::default(), Vec::new())
            }
            Err(_) => {
                metrics().degraded_accounts.inc();
                warn!(
                    account_id = %account.account_id,
                    timeout_ms = %self.store_read_timeout.as_millis(),
                    "Store read timed out, reporting zero summary"
                );
                (MetricsSummary::default(), Vec::new())
            }
        };

        let health = SessionHealth::classify(account);
        let label = HealthLabel::derive(health, !missing.is_empty());

        AccountReport {
            account_id: account.account_id.clone(),
            summary,
            missing_dates: missing,
            health,
            label,
        }
    }
}

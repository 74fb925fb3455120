//! Manual synchronous single-account repair.
//!
//! Unlike the background worker, refresh reports exactly which dates got
//! fresh data and which failed, so callers can show partial success
//! precisely. Re-running for an already-synced date simply overwrites the
//! row with fresher data.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use engine_core::{Account, Clock, DailyAggregate, DateRange, Error, Result, StoredStatus};
use metrics_store::{AccountRegistry, MetricsStore};
use platform_client::{AdsPlatform, ReportPayload};
use telemetry::metrics;

/// The synced/failed date split a refresh returns.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshResult {
    pub synced_dates: Vec<NaiveDate>,
    pub failed_dates: Vec<NaiveDate>,
}

impl RefreshResult {
    pub fn all_failed(&self) -> bool {
        self.synced_dates.is_empty()
    }
}

/// Synchronous single-account repair path.
pub struct Refresher {
    registry: Arc<dyn AccountRegistry>,
    store: Arc<dyn MetricsStore>,
    platform: Arc<dyn AdsPlatform>,
    clock: Arc<dyn Clock>,
}

impl Refresher {
    pub fn new(
        registry: Arc<dyn AccountRegistry>,
        store: Arc<dyn MetricsStore>,
        platform: Arc<dyn AdsPlatform>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            store,
            platform,
            clock,
        }
    }

    /// Refresh every date of the range for one account.
    ///
    /// Prefers a single range call; falls back to per-date calls when the
    /// range call fails for a non-credential reason or answers a multi-day
    /// range with totals only. A date the platform
    /// knows nothing about is written as an explicit zero row so the gap
    /// closes; a date whose fetch or write fails lands in `failed_dates`.
    pub async fn refresh_one(&self, account_id: &str, range: DateRange) -> Result<RefreshResult> {
        metrics().refreshes.inc();

        let account = self.get_account(account_id).await?;
        if account.is_deleted() {
            return Err(Error::AccountDeleted(account_id.to_string()));
        }
        if !account.has_credential() {
            return Err(Error::CredentialMissing(account_id.to_string()));
        }

        let result = match self
            .platform
            .fetch_range(&account.credential, account_id, range)
            .await
        {
            Ok(payload) => self.apply_range_payload(&account, range, payload).await,
            Err(e) if e.is_credential_failure() => {
                metrics().credential_rejections.inc();
                warn!(account_id = account_id, error = %e, "Refresh rejected by platform");
                RefreshResult {
                    synced_dates: Vec::new(),
                    failed_dates: range.days().collect(),
                }
            }
            Err(e) => {
                metrics().refresh_fallbacks.inc();
                warn!(
                    account_id = account_id,
                    range = %range,
                    error = %e,
                    "Range call failed, falling back to per-date calls"
                );
                self.refresh_per_date(&account, range).await
            }
        };

        let status = if result.all_failed() {
            StoredStatus::Inactive
        } else {
            StoredStatus::Active
        };
        let last_sync_at = (!result.all_failed()).then(|| self.clock.now());
        if let Err(e) = self
            .registry
            .update_status(account_id, status, last_sync_at)
            .await
        {
            warn!(account_id = account_id, error = %e, "Failed to update status after refresh");
        }

        info!(
            account_id = account_id,
            synced = result.synced_dates.len(),
            failed = result.failed_dates.len(),
            range = %range,
            "Refresh finished"
        );
        Ok(result)
    }

    async fn get_account(&self, account_id: &str) -> Result<Account> {
        let accounts = self
            .registry
            .get_accounts(&[account_id.to_string()])
            .await?;
        accounts
            .into_iter()
            .next()
            .ok_or_else(|| Error::AccountNotFound(account_id.to_string()))
    }

    /// Write a successful range payload. Dates the payload omits are filled
    /// with zero rows; the platform answered for the whole range, so absence
    /// means no activity rather than unknown.
    async fn apply_range_payload(
        &self,
        account: &Account,
        range: DateRange,
        payload: ReportPayload,
    ) -> RefreshResult {
        let rows: Vec<DailyAggregate> = match payload {
            ReportPayload::Daily(days) => {
                let mut rows: Vec<DailyAggregate> =
                    days.into_iter().filter(|d| range.contains(d.date)).collect();
                let covered: std::collections::BTreeSet<NaiveDate> =
                    rows.iter().map(|r| r.date).collect();
                for date in range.days().filter(|d| !covered.contains(d)) {
                    rows.push(DailyAggregate::zero(&account.account_id, date));
                }
                rows.sort_by_key(|r| r.date);
                rows
            }
            ReportPayload::Aggregate(totals) if range.len_days() == 1 => {
                vec![totals.into_daily(&account.account_id, range.start())]
            }
            ReportPayload::Aggregate(_) => {
                // A multi-day range with totals only cannot be split into
                // day rows without fabricating data, so each date is
                // repaired on its own instead.
                metrics().refresh_fallbacks.inc();
                warn!(
                    account_id = %account.account_id,
                    range = %range,
                    "Aggregate-only payload over multi-day range, repairing per date"
                );
                return self.refresh_per_date(account, range).await;
            }
            ReportPayload::Empty => range
                .days()
                .map(|date| DailyAggregate::zero(&account.account_id, date))
                .collect(),
        };

        match self.store.upsert_days(&rows).await {
            Ok(_) => RefreshResult {
                synced_dates: rows.iter().map(|r| r.date).collect(),
                failed_dates: Vec::new(),
            },
            Err(e) => {
                warn!(account_id = %account.account_id, error = %e, "Refresh upsert failed");
                RefreshResult {
                    synced_dates: Vec::new(),
                    failed_dates: range.days().collect(),
                }
            }
        }
    }

    /// Per-date fallback: each date fetches and upserts on its own, so a
    /// store or platform failure fails exactly that date.
    async fn refresh_per_date(&self, account: &Account, range: DateRange) -> RefreshResult {
        let mut result = RefreshResult::default();

        for date in range.days() {
            let row = match self
                .platform
                .fetch_day(&account.credential, &account.account_id, date)
                .await
            {
                Ok(Some(row)) => row,
                Ok(None) => DailyAggregate::zero(&account.account_id, date),
                Err(e) => {
                    warn!(
                        account_id = %account.account_id,
                        date = %date,
                        error = %e,
                        "Per-date fetch failed"
                    );
                    result.failed_dates.push(date);
                    continue;
                }
            };

            match self.store.upsert_days(std::slice::from_ref(&row)).await {
                Ok(_) => result.synced_dates.push(date),
                Err(e) => {
                    warn!(
                        account_id = %account.account_id,
                        date = %date,
                        error = %e,
                        "Per-date upsert failed"
                    );
                    result.failed_dates.push(date);
                }
            }
        }

        result
    }
}

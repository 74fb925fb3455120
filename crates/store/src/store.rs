//! Store traits and their ClickHouse implementations.
//!
//! The engine depends on the `MetricsStore` and `AccountRegistry` traits
//! only; ClickHouse is one backing. Upserts are plain inserts into
//! ReplacingMergeTree tables, reads use FINAL so the newest version of each
//! key wins.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use clickhouse::Row;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use engine_core::{Account, DailyAggregate, DateRange, Error, Result, StoredStatus};
use telemetry::metrics;

use crate::client::StoreClient;

/// Durable per-account, per-date aggregate storage.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// All stored rows for the account in the inclusive range, ascending by
    /// date.
    async fn query_range(
        &self,
        account_id: &str,
        range: DateRange,
    ) -> Result<Vec<DailyAggregate>>;

    /// Insert-or-overwrite rows keyed by (account_id, date). Returns the
    /// number of rows written.
    async fn upsert_days(&self, rows: &[DailyAggregate]) -> Result<usize>;
}

/// Read/write boundary to the account registry.
///
/// The engine never creates or deletes accounts; `update_status` is the only
/// write, and it touches status and sync timestamp only.
#[async_trait]
pub trait AccountRegistry: Send + Sync {
    /// Fetch the requested accounts. Unknown ids are simply absent from the
    /// result.
    async fn get_accounts(&self, account_ids: &[String]) -> Result<Vec<Account>>;

    async fn update_status(
        &self,
        account_id: &str,
        status: StoredStatus,
        last_sync_at: Option<DateTime<Utc>>,
    ) -> Result<()>;
}

// ClickHouse Date is days since 1970-01-01 in the native format.

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

fn date_to_days(date: NaiveDate) -> Result<u16> {
    // Date covers 1970-01-01 through 2149-06-06 only; a silent wrap here
    // would file metrics under an unrelated date.
    u16::try_from((date - epoch()).num_days())
        .map_err(|_| Error::store(format!("Date {} outside the storable range", date)))
}

fn days_to_date(days: u16) -> NaiveDate {
    epoch() + Duration::days(days as i64)
}

fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

/// Flattened metrics row for ClickHouse.
#[derive(Debug, Clone, Row, Serialize, Deserialize)]
struct DailyMetricsRow {
    account_id: String,
    date: u16, // Date, days since epoch
    spend: f64,
    revenue_broad: f64,
    revenue_direct: f64,
    clicks: u64,
    orders: u64,
    impressions: u64,
    views: u64,
    ctr: f64,
    cpc: f64,
    conversion_rate: f64,
    updated_at: i64, // DateTime64(3) as milliseconds
}

impl DailyMetricsRow {
    fn from_aggregate(aggregate: &DailyAggregate, updated_at: i64) -> Result<Self> {
        Ok(Self {
            account_id: aggregate.account_id.clone(),
            date: date_to_days(aggregate.date)?,
            spend: aggregate.spend,
            revenue_broad: aggregate.revenue_broad,
            revenue_direct: aggregate.revenue_direct,
            clicks: aggregate.clicks,
            orders: aggregate.orders,
            impressions: aggregate.impressions,
            views: aggregate.views,
            ctr: aggregate.ctr,
            cpc: aggregate.cpc,
            conversion_rate: aggregate.conversion_rate,
            updated_at,
        })
    }

    fn into_aggregate(self) -> DailyAggregate {
        DailyAggregate {
            account_id: self.account_id,
            date: days_to_date(self.date),
            spend: self.spend,
            revenue_broad: self.revenue_broad,
            revenue_direct: self.revenue_direct,
            clicks: self.clicks,
            orders: self.orders,
            impressions: self.impressions,
            views: self.views,
            ctr: self.ctr,
            cpc: self.cpc,
            conversion_rate: self.conversion_rate,
        }
    }
}

/// Account row for ClickHouse.
#[derive(Debug, Clone, Row, Serialize, Deserialize)]
struct AccountRow {
    account_id: String,
    credential: String,
    stored_status: String,
    last_sync_at: Option<i64>, // DateTime64(3) as milliseconds
    owner_user_id: String,
    updated_at: i64,
}

impl AccountRow {
    fn into_account(self) -> Result<Account> {
        let owner_user_id = Uuid::parse_str(&self.owner_user_id)
            .map_err(|e| Error::internal(format!("Bad owner id in registry: {}", e)))?;
        Ok(Account {
            account_id: self.account_id,
            credential: self.credential,
            stored_status: StoredStatus::parse(&self.stored_status),
            last_sync_at: self.last_sync_at.map(millis_to_datetime),
            owner_user_id,
        })
    }

    fn from_account(account: &Account, updated_at: i64) -> Self {
        Self {
            account_id: account.account_id.clone(),
            credential: account.credential.clone(),
            stored_status: account.stored_status.as_str().to_string(),
            last_sync_at: account.last_sync_at.map(|t| t.timestamp_millis()),
            owner_user_id: account.owner_user_id.to_string(),
            updated_at,
        }
    }
}

#[async_trait]
impl MetricsStore for StoreClient {
    async fn query_range(
        &self,
        account_id: &str,
        range: DateRange,
    ) -> Result<Vec<DailyAggregate>> {
        let start = std::time::Instant::now();
        metrics().store_reads.inc();

        let rows: Vec<DailyMetricsRow> = self
            .inner()
            .query(
                "SELECT account_id, date, spend, revenue_broad, revenue_direct, \
                 clicks, orders, impressions, views, ctr, cpc, conversion_rate, \
                 toUnixTimestamp64Milli(updated_at) AS updated_at \
                 FROM adlens.daily_metrics FINAL \
                 WHERE account_id = ? AND date >= ? AND date <= ? \
                 ORDER BY date",
            )
            .bind(account_id)
            .bind(date_to_days(range.start())?)
            .bind(date_to_days(range.end())?)
            .fetch_all()
            .await
            .map_err(|e| {
                metrics().store_read_errors.inc();
                Error::store(format!("Query error: {}", e))
            })?;

        metrics()
            .store_query_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        Ok(rows.into_iter().map(DailyMetricsRow::into_aggregate).collect())
    }

    async fn upsert_days(&self, rows: &[DailyAggregate]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().timestamp_millis();
        let count = rows.len();

        let mut insert = self
            .inner()
            .insert("adlens.daily_metrics")
            .map_err(|e| Error::store(format!("Insert error: {}", e)))?;

        for row in rows {
            insert
                .write(&DailyMetricsRow::from_aggregate(row, now)?)
                .await
                .map_err(|e| Error::store(format!("Write error: {}", e)))?;
        }

        insert
            .end()
            .await
            .map_err(|e| Error::store(format!("End error: {}", e)))?;

        metrics().days_upserted.inc_by(count as u64);
        debug!(count = count, "Upserted daily metrics");

        Ok(count)
    }
}

#[async_trait]
impl AccountRegistry for StoreClient {
    async fn get_accounts(&self, account_ids: &[String]) -> Result<Vec<Account>> {
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<AccountRow> = self
            .inner()
            .query(
                "SELECT account_id, credential, stored_status, \
                 toUnixTimestamp64Milli(last_sync_at) AS last_sync_at, \
                 owner_user_id, toUnixTimestamp64Milli(updated_at) AS updated_at \
                 FROM adlens.accounts FINAL \
                 WHERE account_id IN ?",
            )
            .bind(account_ids)
            .fetch_all()
            .await
            .map_err(|e| Error::store(format!("Query error: {}", e)))?;

        rows.into_iter().map(AccountRow::into_account).collect()
    }

    async fn update_status(
        &self,
        account_id: &str,
        status: StoredStatus,
        last_sync_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        // ReplacingMergeTree has no in-place update; write a new version of
        // the full row instead.
        let mut accounts = self.get_accounts(&[account_id.to_string()]).await?;
        let mut account = accounts
            .pop()
            .ok_or_else(|| Error::AccountNotFound(account_id.to_string()))?;

        account.stored_status = status;
        if last_sync_at.is_some() {
            account.last_sync_at = last_sync_at;
        }

        let row = AccountRow::from_account(&account, Utc::now().timestamp_millis());

        let mut insert = self
            .inner()
            .insert("adlens.accounts")
            .map_err(|e| Error::store(format!("Insert error: {}", e)))?;
        insert
            .write(&row)
            .await
            .map_err(|e| Error::store(format!("Write error: {}", e)))?;
        insert
            .end()
            .await
            .map_err(|e| Error::store(format!("End error: {}", e)))?;

        debug!(
            account_id = account_id,
            status = status.as_str(),
            "Updated account status"
        );

        Ok(())
    }
}

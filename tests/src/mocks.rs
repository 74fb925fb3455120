//! Mock implementations for testing.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;

use engine_core::{Account, Campaign, DailyAggregate, DateRange, Error, Result, StoredStatus};
use metrics_store::{AccountRegistry, MetricsStore};
use platform_client::{AdsPlatform, ReportPayload};

/// In-memory metrics store keyed by `(account_id, date)`, matching the
/// last-write-wins semantics of the real ReplacingMergeTree backing.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    rows: Arc<Mutex<BTreeMap<(String, NaiveDate), DailyAggregate>>>,
    fail_reads_for: Arc<Mutex<HashSet<String>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make reads for one account fail with a store error.
    pub fn fail_reads_for(&self, account_id: &str) {
        self.fail_reads_for.lock().insert(account_id.to_string());
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    pub fn row(&self, account_id: &str, date: NaiveDate) -> Option<DailyAggregate> {
        self.rows
            .lock()
            .get(&(account_id.to_string(), date))
            .cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn seed(&self, rows: Vec<DailyAggregate>) {
        let mut map = self.rows.lock();
        for row in rows {
            map.insert((row.account_id.clone(), row.date), row);
        }
    }
}

#[async_trait]
impl MetricsStore for InMemoryStore {
    async fn query_range(
        &self,
        account_id: &str,
        range: DateRange,
    ) -> Result<Vec<DailyAggregate>> {
        if self.fail_reads_for.lock().contains(account_id) {
            return Err(Error::store("simulated read failure"));
        }
        Ok(self
            .rows
            .lock()
            .range(
                (account_id.to_string(), range.start())
                    ..=(account_id.to_string(), range.end()),
            )
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn upsert_days(&self, rows: &[DailyAggregate]) -> Result<usize> {
        if *self.fail_writes.lock() {
            return Err(Error::store("simulated write failure"));
        }
        let mut map = self.rows.lock();
        for row in rows {
            map.insert((row.account_id.clone(), row.date), row.clone());
        }
        Ok(rows.len())
    }
}

/// In-memory account registry that records status updates.
#[derive(Clone, Default)]
pub struct InMemoryRegistry {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    fail_reads: Arc<Mutex<bool>>,
}

impl InMemoryRegistry {
    pub fn new(accounts: Vec<Account>) -> Self {
        let map = accounts
            .into_iter()
            .map(|a| (a.account_id.clone(), a))
            .collect();
        Self {
            accounts: Arc::new(Mutex::new(map)),
            fail_reads: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock() = fail;
    }

    pub fn account(&self, account_id: &str) -> Option<Account> {
        self.accounts.lock().get(account_id).cloned()
    }
}

#[async_trait]
impl AccountRegistry for InMemoryRegistry {
    async fn get_accounts(&self, account_ids: &[String]) -> Result<Vec<Account>> {
        if *self.fail_reads.lock() {
            return Err(Error::store("simulated registry failure"));
        }
        let map = self.accounts.lock();
        Ok(account_ids
            .iter()
            .filter_map(|id| map.get(id).cloned())
            .collect())
    }

    async fn update_status(
        &self,
        account_id: &str,
        status: StoredStatus,
        last_sync_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut map = self.accounts.lock();
        let account = map
            .get_mut(account_id)
            .ok_or_else(|| Error::AccountNotFound(account_id.to_string()))?;
        account.stored_status = status;
        if last_sync_at.is_some() {
            account.last_sync_at = last_sync_at;
        }
        Ok(())
    }
}

/// How the mock platform answers a single `fetch_day` call.
#[derive(Clone)]
pub enum DayScript {
    Row(DailyAggregate),
    /// The platform reports no activity for the day.
    NoActivity,
    Fail,
}

/// Scripted responses for one account on the mock platform.
#[derive(Clone)]
pub enum PlatformScript {
    /// `fetch_range` succeeds with this payload.
    Range(ReportPayload),
    /// `fetch_range` fails; `fetch_day` answers from this per-date map.
    PerDate(HashMap<NaiveDate, DayScript>),
    /// Every call fails with a network-style error.
    Fail,
    /// Every call fails with a credential rejection.
    RejectCredential,
}

/// Scripted ad platform that records the order of range calls.
#[derive(Clone, Default)]
pub struct MockPlatform {
    scripts: Arc<Mutex<HashMap<String, PlatformScript>>>,
    campaigns: Arc<Mutex<Vec<Campaign>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, account_id: &str, script: PlatformScript) {
        self.scripts.lock().insert(account_id.to_string(), script);
    }

    pub fn set_campaigns(&self, campaigns: Vec<Campaign>) {
        *self.campaigns.lock() = campaigns;
    }

    /// Account ids in the order `fetch_range` was called.
    pub fn range_calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl AdsPlatform for MockPlatform {
    async fn fetch_range(
        &self,
        _credential: &str,
        account_id: &str,
        _range: DateRange,
    ) -> Result<ReportPayload> {
        self.calls.lock().push(account_id.to_string());
        match self.scripts.lock().get(account_id) {
            Some(PlatformScript::Range(payload)) => Ok(payload.clone()),
            Some(PlatformScript::PerDate(_)) | Some(PlatformScript::Fail) => {
                Err(Error::external("simulated platform failure"))
            }
            Some(PlatformScript::RejectCredential) => {
                Err(Error::credential_rejected("simulated 401"))
            }
            None => Ok(ReportPayload::Empty),
        }
    }

    async fn fetch_day(
        &self,
        _credential: &str,
        account_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyAggregate>> {
        match self.scripts.lock().get(account_id) {
            Some(PlatformScript::PerDate(days)) => match days.get(&date) {
                Some(DayScript::Row(row)) => Ok(Some(row.clone())),
                Some(DayScript::NoActivity) | None => Ok(None),
                Some(DayScript::Fail) => Err(Error::external("simulated platform failure")),
            },
            Some(PlatformScript::RejectCredential) => {
                Err(Error::credential_rejected("simulated 401"))
            }
            Some(PlatformScript::Fail) => Err(Error::external("simulated platform failure")),
            _ => Ok(None),
        }
    }

    async fn fetch_campaigns(
        &self,
        _credential: &str,
        _range: DateRange,
    ) -> Result<Vec<Campaign>> {
        Ok(self.campaigns.lock().clone())
    }
}

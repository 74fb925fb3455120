//! Raw platform payloads and their normalization.
//!
//! The platform's reporting endpoint returns one of three shapes depending
//! on endpoint version and account age: a day-level breakdown, a range-level
//! aggregate with no breakdown, or nothing. The shape is resolved exactly
//! once here into a tagged union; the core only ever sees normalized
//! `DailyAggregate` / `Campaign` records.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;
use validator::Validate;

use engine_core::{Campaign, CampaignState, DailyAggregate};

/// Monetary fields arrive as integers scaled by this fixed platform divisor.
pub const MONEY_DIVISOR: f64 = 100_000.0;

fn money(raw: i64) -> f64 {
    raw as f64 / MONEY_DIVISOR
}

/// Raw reporting response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RawReport {
    #[serde(default)]
    pub data: Option<RawReportData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReportData {
    /// Day-level breakdown, when the endpoint provides one.
    #[serde(default)]
    pub daily: Vec<RawDayEntry>,
    /// Range-level totals, present even when `daily` is not.
    #[serde(default)]
    pub totals: Option<RawTotals>,
}

/// One day of raw metrics.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDayEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub impression: u64,
    #[serde(default)]
    pub view: u64,
    #[serde(default)]
    pub click: u64,
    #[serde(default)]
    pub checkout: u64,
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub broad_gmv: i64,
    #[serde(default)]
    pub direct_gmv: i64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub cpc: i64,
    #[serde(default)]
    pub cr: f64,
}

impl RawDayEntry {
    fn normalize(&self, account_id: &str) -> DailyAggregate {
        DailyAggregate {
            account_id: account_id.to_string(),
            date: self.date,
            spend: money(self.cost),
            revenue_broad: money(self.broad_gmv),
            revenue_direct: money(self.direct_gmv),
            clicks: self.click,
            orders: self.checkout,
            impressions: self.impression,
            views: self.view,
            ctr: self.ctr,
            cpc: money(self.cpc),
            conversion_rate: self.cr,
        }
    }
}

/// Raw range-level totals.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTotals {
    #[serde(default)]
    pub impression: u64,
    #[serde(default)]
    pub view: u64,
    #[serde(default)]
    pub click: u64,
    #[serde(default)]
    pub checkout: u64,
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub broad_gmv: i64,
    #[serde(default)]
    pub direct_gmv: i64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub cpc: i64,
    #[serde(default)]
    pub cr: f64,
}

/// Normalized range-level totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeTotals {
    pub spend: f64,
    pub revenue_broad: f64,
    pub revenue_direct: f64,
    pub clicks: u64,
    pub orders: u64,
    pub impressions: u64,
    pub views: u64,
    pub ctr: f64,
    pub cpc: f64,
    pub conversion_rate: f64,
}

impl RangeTotals {
    fn from_raw(raw: &RawTotals) -> Self {
        Self {
            spend: money(raw.cost),
            revenue_broad: money(raw.broad_gmv),
            revenue_direct: money(raw.direct_gmv),
            clicks: raw.click,
            orders: raw.checkout,
            impressions: raw.impression,
            views: raw.view,
            ctr: raw.ctr,
            cpc: money(raw.cpc),
            conversion_rate: raw.cr,
        }
    }

    /// Collapse the totals onto a single calendar day. Only valid when the
    /// requested range covers exactly that day; never use this to fabricate
    /// per-day splits of a multi-day aggregate.
    pub fn into_daily(self, account_id: impl Into<String>, date: NaiveDate) -> DailyAggregate {
        DailyAggregate {
            account_id: account_id.into(),
            date,
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

/// Report payload with its shape resolved.
#[derive(Debug, Clone)]
pub enum ReportPayload {
    /// Day-level breakdown, one aggregate per covered day.
    Daily(Vec<DailyAggregate>),
    /// Range-level totals only, no per-day breakdown.
    Aggregate(RangeTotals),
    /// The platform had nothing for this account and range.
    Empty,
}

impl ReportPayload {
    /// The aggregate for exactly `date`, whichever shape the payload took.
    /// A daily breakdown covering other dates but not this one yields
    /// nothing; totals for a single-day request collapse onto that day.
    pub fn day(self, account_id: &str, date: NaiveDate) -> Option<DailyAggregate> {
        match self {
            Self::Daily(days) => days.into_iter().find(|d| d.date == date),
            Self::Aggregate(totals) => Some(totals.into_daily(account_id, date)),
            Self::Empty => None,
        }
    }
}

impl RawReport {
    /// Resolve the raw envelope into its payload shape. A day-level
    /// breakdown wins over totals when both are present.
    pub fn resolve(self, account_id: &str) -> ReportPayload {
        match self.data {
            None => ReportPayload::Empty,
            Some(data) if !data.daily.is_empty() => {
                let mut days: Vec<DailyAggregate> = data
                    .daily
                    .iter()
                    .map(|entry| entry.normalize(account_id))
                    .collect();
                days.sort_by_key(|d| d.date);
                ReportPayload::Daily(days)
            }
            Some(data) => match data.totals {
                Some(ref totals) => ReportPayload::Aggregate(RangeTotals::from_raw(totals)),
                None => ReportPayload::Empty,
            },
        }
    }
}

/// Raw campaign-listing response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCampaignList {
    #[serde(default)]
    pub data: Option<RawCampaignData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCampaignData {
    #[serde(default)]
    pub entry_list: Vec<RawCampaign>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCampaign {
    pub campaignid: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub report: RawCampaignReport,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCampaignReport {
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub broad_gmv: i64,
    #[serde(default)]
    pub click: u64,
    #[serde(default)]
    pub impression: u64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub cr: f64,
}

impl RawCampaign {
    fn normalize(&self) -> Campaign {
        let state = match self.state.to_ascii_lowercase().as_str() {
            "ongoing" => CampaignState::Ongoing,
            "paused" => CampaignState::Paused,
            _ => CampaignState::Ended,
        };
        Campaign {
            campaign_id: self.campaignid.to_string(),
            title: self.title.clone(),
            state,
            spend: money(self.report.cost),
            revenue: money(self.report.broad_gmv),
            clicks: self.report.click,
            impressions: self.report.impression,
            ctr: self.report.ctr,
            conversion_rate: self.report.cr,
        }
    }
}

/// Normalize and validate the raw campaign listing. Invalid entries are
/// dropped with a warning rather than failing the whole listing.
pub fn normalize_campaigns(raw: RawCampaignList) -> Vec<Campaign> {
    let entries = raw.data.map(|d| d.entry_list).unwrap_or_default();

    entries
        .iter()
        .map(RawCampaign::normalize)
        .filter(|campaign| match campaign.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    campaign_id = %campaign.campaign_id,
                    error = %e,
                    "Dropping invalid campaign from listing"
                );
                false
            }
        })
        .collect()
}

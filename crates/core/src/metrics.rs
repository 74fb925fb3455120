//! Daily metric aggregates and range summaries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical metric snapshot for one (account, calendar day).
///
/// A missing row means "not yet synchronized", never "zero activity". Ratio
/// fields are computed once at ingest and cached; they are never recomputed
/// from the additive fields on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub account_id: String,
    pub date: NaiveDate,

    pub spend: f64,
    pub revenue_broad: f64,
    pub revenue_direct: f64,
    pub clicks: u64,
    pub orders: u64,
    pub impressions: u64,
    pub views: u64,

    // Cached ratios (percent for ctr/conversion_rate, currency for cpc).
    pub ctr: f64,
    pub cpc: f64,
    pub conversion_rate: f64,
}

impl DailyAggregate {
    /// Zero-valued row asserting "synchronized, no activity" for a day. This
    /// is distinct from an absent row, which asserts nothing.
    pub fn zero(account_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            account_id: account_id.into(),
            date,
            spend: 0.0,
            revenue_broad: 0.0,
            revenue_direct: 0.0,
            clicks: 0,
            orders: 0,
            impressions: 0,
            views: 0,
            ctr: 0.0,
            cpc: 0.0,
            conversion_rate: 0.0,
        }
    }
}

/// Phase-1 aggregate of stored rows over a range.
///
/// Additive fields are summed. Ratio fields are averaged across the days
/// that have data, matching the store's cached-ratio convention; they are
/// not recomputed from summed numerators and denominators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
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

    /// How many days in the range actually had a stored row.
    pub days_with_data: usize,
}

impl MetricsSummary {
    pub fn from_rows(rows: &[DailyAggregate]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            days_with_data: rows.len(),
            ..Self::default()
        };

        for row in rows {
            summary.spend += row.spend;
            summary.revenue_broad += row.revenue_broad;
            summary.revenue_direct += row.revenue_direct;
            summary.clicks += row.clicks;
            summary.orders += row.orders;
            summary.impressions += row.impressions;
            summary.views += row.views;
            summary.ctr += row.ctr;
            summary.cpc += row.cpc;
            summary.conversion_rate += row.conversion_rate;
        }

        let days = rows.len() as f64;
        summary.ctr /= days;
        summary.cpc /= days;
        summary.conversion_rate /= days;

        summary
    }
}

//! Test fixtures and builders.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use engine_core::{Account, Campaign, CampaignState, DailyAggregate, DateRange, StoredStatus};

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).expect("valid fixture date")
}

pub fn range(start_day: u32, end_day: u32) -> DateRange {
    DateRange::new(date(start_day), date(end_day))
}

/// An active account with a usable credential and a past sync.
pub fn account(account_id: &str) -> Account {
    Account {
        account_id: account_id.to_string(),
        credential: format!("SPC_EC={account_id}"),
        stored_status: StoredStatus::Active,
        last_sync_at: Some(Utc::now()),
        owner_user_id: Uuid::new_v4(),
    }
}

pub fn account_with_status(account_id: &str, status: StoredStatus) -> Account {
    Account {
        stored_status: status,
        ..account(account_id)
    }
}

pub fn account_without_credential(account_id: &str) -> Account {
    Account {
        credential: String::new(),
        ..account(account_id)
    }
}

/// A day row with distinguishable non-zero values derived from the day.
pub fn aggregate(account_id: &str, day: u32) -> DailyAggregate {
    DailyAggregate {
        account_id: account_id.to_string(),
        date: date(day),
        spend: day as f64 * 10.0,
        revenue_broad: day as f64 * 25.0,
        revenue_direct: day as f64 * 15.0,
        clicks: day as u64 * 100,
        orders: day as u64 * 3,
        impressions: day as u64 * 1000,
        views: day as u64 * 900,
        ctr: 1.5,
        cpc: 0.1,
        conversion_rate: 3.0,
    }
}

/// Day rows for an inclusive span of fixture days.
pub fn aggregates(account_id: &str, start_day: u32, end_day: u32) -> Vec<DailyAggregate> {
    (start_day..=end_day)
        .map(|day| aggregate(account_id, day))
        .collect()
}

pub fn campaign(campaign_id: &str, spend: f64, revenue: f64, ctr: f64, cr: f64) -> Campaign {
    Campaign {
        campaign_id: campaign_id.to_string(),
        title: format!("Campaign {campaign_id}"),
        state: CampaignState::Ongoing,
        spend,
        revenue,
        clicks: 100,
        impressions: 10_000,
        ctr,
        conversion_rate: cr,
    }
}

//! Campaign records sourced from the external platform.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Lifecycle state of an advertising campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignState {
    Ongoing,
    Paused,
    Ended,
}

/// One advertising campaign with its rolling window of metric totals.
///
/// Sourced entirely from the platform client for the requested range; the
/// core never persists campaigns.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Campaign {
    #[validate(length(min = 1, max = 64))]
    pub campaign_id: String,
    #[validate(length(max = 500))]
    pub title: String,
    pub state: CampaignState,

    pub spend: f64,
    pub revenue: f64,
    pub clicks: u64,
    pub impressions: u64,

    /// Cached ratios from the platform report, in percent.
    #[validate(range(min = 0.0))]
    pub ctr: f64,
    #[validate(range(min = 0.0))]
    pub conversion_rate: f64,
}

impl Campaign {
    /// Return on ad spend; zero when nothing was spent.
    pub fn roas(&self) -> f64 {
        if self.spend > 0.0 {
            self.revenue / self.spend
        } else {
            0.0
        }
    }
}

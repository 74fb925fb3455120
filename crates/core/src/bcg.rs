//! BCG-style growth/share classification of campaigns.
//!
//! Classification is a pure function of the cohort's current metrics:
//! re-running with the same inputs yields the same categories. It is
//! recomputed on every request and never cached, since cohort membership can
//! change between requests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::campaign::Campaign;

/// Growth-rate threshold separating high from low momentum.
pub const GROWTH_THRESHOLD: f64 = 10.0;

/// Relative-market-share threshold; 100 means "at the cohort average".
pub const SHARE_THRESHOLD: f64 = 100.0;

/// Quadrant assignment for one campaign, relative to its cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BcgQuadrant {
    Stars,
    CashCows,
    QuestionMarks,
    Dogs,
}

/// Momentum proxy used in place of a true period-over-period growth rate.
///
/// No historical time series is retained per campaign, so the default
/// derives momentum from engagement ratios. A known approximation: swap in a
/// series-backed strategy here once one exists.
pub trait GrowthStrategy {
    fn growth_rate(&self, campaign: &Campaign) -> f64;
}

/// Default heuristic: `ctr * 10 + conversion_rate * 5`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngagementGrowth;

impl GrowthStrategy for EngagementGrowth {
    fn growth_rate(&self, campaign: &Campaign) -> f64 {
        campaign.ctr * 10.0 + campaign.conversion_rate * 5.0
    }
}

/// Mean ROAS across the cohort. An empty cohort averages to 1 so downstream
/// share math never divides by zero.
pub fn average_roas(cohort: &[Campaign]) -> f64 {
    if cohort.is_empty() {
        return 1.0;
    }
    cohort.iter().map(Campaign::roas).sum::<f64>() / cohort.len() as f64
}

/// Classify every campaign in the cohort with the default growth heuristic.
pub fn classify_campaigns(cohort: &[Campaign]) -> HashMap<String, BcgQuadrant> {
    classify_campaigns_with(cohort, &EngagementGrowth)
}

/// Classify every campaign in the cohort with a caller-chosen growth
/// strategy. The cohort must be the full set being compared together: the
/// same account selection and date range.
pub fn classify_campaigns_with(
    cohort: &[Campaign],
    strategy: &dyn GrowthStrategy,
) -> HashMap<String, BcgQuadrant> {
    let avg_roas = average_roas(cohort);

    cohort
        .iter()
        .map(|campaign| {
            let market_share = if avg_roas > 0.0 {
                campaign.roas() / avg_roas * 100.0
            } else {
                0.0
            };
            let growth_rate = strategy.growth_rate(campaign);
            (campaign.campaign_id.clone(), quadrant(growth_rate, market_share))
        })
        .collect()
}

fn quadrant(growth_rate: f64, market_share: f64) -> BcgQuadrant {
    match (growth_rate > GROWTH_THRESHOLD, market_share > SHARE_THRESHOLD) {
        (true, true) => BcgQuadrant::Stars,
        (false, true) => BcgQuadrant::CashCows,
        (true, false) => BcgQuadrant::QuestionMarks,
        (false, false) => BcgQuadrant::Dogs,
    }
}

//! Campaign classification over platform-sourced cohorts.

use adlens_engine::{classify_campaigns, classify_campaigns_with, BcgQuadrant, GrowthStrategy};
use engine_core::Campaign;
use platform_client::AdsPlatform;

use integration_tests::fixtures::{account, campaign, range};
use integration_tests::mocks::MockPlatform;

#[tokio::test]
async fn platform_cohort_classifies_into_all_quadrants() {
    let platform = MockPlatform::new();
    // Cohort average ROAS is 2.5, so the share threshold sits at ROAS 2.5.
    platform.set_campaigns(vec![
        campaign("star", 100.0, 400.0, 2.0, 1.0),
        campaign("cow", 100.0, 400.0, 0.5, 0.5),
        campaign("question", 100.0, 100.0, 2.0, 1.0),
        campaign("dog", 100.0, 100.0, 0.5, 0.5),
    ]);

    let owner = account("shop-a");
    let cohort = platform
        .fetch_campaigns(&owner.credential, range(1, 7))
        .await
        .unwrap();

    let result = classify_campaigns(&cohort);
    assert_eq!(result.len(), 4);
    assert_eq!(result["star"], BcgQuadrant::Stars);
    assert_eq!(result["cow"], BcgQuadrant::CashCows);
    assert_eq!(result["question"], BcgQuadrant::QuestionMarks);
    assert_eq!(result["dog"], BcgQuadrant::Dogs);
}

#[tokio::test]
async fn classification_is_recomputed_per_cohort() {
    // The same campaign lands in different quadrants depending on which
    // cohort it is compared against; nothing is cached between calls.
    let strong = campaign("c1", 100.0, 500.0, 2.0, 1.0);

    let weak_cohort = vec![strong.clone(), campaign("c2", 100.0, 100.0, 0.5, 0.5)];
    let strong_cohort = vec![strong.clone(), campaign("c3", 100.0, 2000.0, 0.5, 0.5)];

    let vs_weak = classify_campaigns(&weak_cohort);
    let vs_strong = classify_campaigns(&strong_cohort);

    assert_eq!(vs_weak["c1"], BcgQuadrant::Stars);
    assert_eq!(vs_strong["c1"], BcgQuadrant::QuestionMarks);
}

struct FlatGrowth(f64);

impl GrowthStrategy for FlatGrowth {
    fn growth_rate(&self, _campaign: &Campaign) -> f64 {
        self.0
    }
}

#[test]
fn growth_strategy_is_pluggable() {
    let cohort = vec![
        campaign("c1", 100.0, 300.0, 0.1, 0.1),
        campaign("c2", 100.0, 100.0, 0.1, 0.1),
    ];

    // With flat high growth, only the share axis differentiates.
    let result = classify_campaigns_with(&cohort, &FlatGrowth(50.0));
    assert_eq!(result["c1"], BcgQuadrant::Stars);
    assert_eq!(result["c2"], BcgQuadrant::QuestionMarks);

    // The default heuristic sees low engagement and demotes both.
    let default = classify_campaigns(&cohort);
    assert_eq!(default["c1"], BcgQuadrant::CashCows);
    assert_eq!(default["c2"], BcgQuadrant::Dogs);
}

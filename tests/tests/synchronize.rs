//! Phase-1 synchronization: summaries, gap annotation, health labels, and
//! fail-open degradation.

use std::sync::Arc;
use std::time::Duration;

use adlens_engine::SyncEngine;
use engine_core::{FixedClock, HealthLabel, SessionHealth, StoredStatus};
use recon_engine::WorkerConfig;

use integration_tests::fixtures::{
    account, account_with_status, account_without_credential, aggregates, range,
};
use integration_tests::mocks::{InMemoryRegistry, InMemoryStore, MockPlatform};

fn test_worker_config() -> WorkerConfig {
    WorkerConfig {
        inter_account_delay: Duration::from_millis(1),
        ..WorkerConfig::default()
    }
}

fn engine(registry: InMemoryRegistry, store: InMemoryStore, platform: MockPlatform) -> SyncEngine {
    SyncEngine::with_components(
        Arc::new(registry),
        Arc::new(store),
        Arc::new(platform),
        Arc::new(FixedClock(chrono::Utc::now())),
        test_worker_config(),
    )
}

#[tokio::test]
async fn one_failing_store_read_degrades_only_that_account() {
    let store = InMemoryStore::new();
    store.seed(aggregates("shop-b", 1, 5));
    store.fail_reads_for("shop-a");

    let registry = InMemoryRegistry::new(vec![account("shop-a"), account("shop-b")]);
    let engine = engine(registry, store, MockPlatform::new());

    let view = engine
        .synchronize(&["shop-a".to_string(), "shop-b".to_string()], range(1, 5))
        .await
        .expect("phase 1 must not fail on a per-account store error");

    assert_eq!(view.accounts.len(), 2);

    let a = &view.accounts[0];
    assert_eq!(a.account_id, "shop-a");
    assert_eq!(a.summary.days_with_data, 0);
    assert_eq!(a.summary.spend, 0.0);
    assert!(a.missing_dates.is_empty(), "degraded reads report no gaps");

    let b = &view.accounts[1];
    assert_eq!(b.account_id, "shop-b");
    assert_eq!(b.summary.days_with_data, 5);
    assert_eq!(b.summary.spend, (1 + 2 + 3 + 4 + 5) as f64 * 10.0);
    assert!(b.missing_dates.is_empty());
}

#[tokio::test]
async fn every_existing_account_yields_exactly_one_record() {
    let registry = InMemoryRegistry::new(vec![account("shop-a"), account("shop-b")]);
    let engine = engine(registry, InMemoryStore::new(), MockPlatform::new());

    // shop-x does not exist; shop-b is requested after it.
    let ids = vec![
        "shop-b".to_string(),
        "shop-x".to_string(),
        "shop-a".to_string(),
    ];
    let view = engine.synchronize(&ids, range(1, 3)).await.unwrap();

    let returned: Vec<_> = view.accounts.iter().map(|a| a.account_id.as_str()).collect();
    assert_eq!(returned, vec!["shop-b", "shop-a"], "caller order, unknown skipped");
}

#[tokio::test]
async fn gaps_escalate_health_to_sync_needed() {
    let store = InMemoryStore::new();
    // Days 1..5 requested but only 1 and 2 stored.
    store.seed(aggregates("shop-a", 1, 2));

    let registry = InMemoryRegistry::new(vec![account("shop-a")]);
    let engine = engine(registry, store, MockPlatform::new());

    let view = engine
        .synchronize(&["shop-a".to_string()], range(1, 5))
        .await
        .unwrap();

    let report = &view.accounts[0];
    assert_eq!(report.health, Some(SessionHealth::Healthy));
    assert_eq!(report.label, HealthLabel::SyncNeeded);
    assert_eq!(report.missing_dates.len(), 3);
}

#[tokio::test]
async fn dead_sessions_keep_their_label_despite_gaps() {
    let registry = InMemoryRegistry::new(vec![
        account_without_credential("shop-a"),
        account_with_status("shop-b", StoredStatus::Inactive),
        account_with_status("shop-c", StoredStatus::Deleted),
    ]);
    let engine = engine(registry, InMemoryStore::new(), MockPlatform::new());

    let ids: Vec<String> = ["shop-a", "shop-b", "shop-c"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let view = engine.synchronize(&ids, range(1, 5)).await.unwrap();

    assert_eq!(view.accounts[0].label, HealthLabel::NoCookies);
    assert_eq!(view.accounts[1].label, HealthLabel::Expired);
    assert_eq!(view.accounts[2].label, HealthLabel::Deleted);
    assert_eq!(view.accounts[2].health, None);
}

#[tokio::test]
async fn reversed_range_is_normalized_not_rejected() {
    let store = InMemoryStore::new();
    store.seed(aggregates("shop-a", 1, 5));

    let registry = InMemoryRegistry::new(vec![account("shop-a")]);
    let engine = engine(registry, store, MockPlatform::new());

    let view = engine
        .synchronize(&["shop-a".to_string()], range(5, 1))
        .await
        .expect("reversed endpoints are swapped, never an error");

    assert_eq!(view.accounts[0].summary.days_with_data, 5);
    assert!(view.accounts[0].missing_dates.is_empty());
}

#[tokio::test]
async fn registry_failure_is_the_only_fatal_error() {
    let registry = InMemoryRegistry::new(vec![account("shop-a")]);
    registry.set_fail_reads(true);
    let engine = engine(registry, InMemoryStore::new(), MockPlatform::new());

    let result = engine.synchronize(&["shop-a".to_string()], range(1, 3)).await;
    assert!(matches!(
        result,
        Err(engine_core::Error::StoreUnavailable(_))
    ));
}

#[tokio::test]
async fn ratio_metrics_are_averaged_not_summed() {
    let store = InMemoryStore::new();
    let mut rows = aggregates("shop-a", 1, 2);
    rows[0].ctr = 2.0;
    rows[1].ctr = 4.0;
    store.seed(rows);

    let registry = InMemoryRegistry::new(vec![account("shop-a")]);
    let engine = engine(registry, store, MockPlatform::new());

    let view = engine
        .synchronize(&["shop-a".to_string()], range(1, 2))
        .await
        .unwrap();

    assert_eq!(view.accounts[0].summary.ctr, 3.0);
}

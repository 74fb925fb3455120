//! Phase-2 background worker: batch isolation, ordering, and status updates.

use std::sync::Arc;
use std::time::Duration;

use adlens_engine::SyncEngine;
use engine_core::{FixedClock, StoredStatus};
use platform_client::ReportPayload;
use recon_engine::WorkerConfig;

use integration_tests::fixtures::{account, aggregates, range};
use integration_tests::mocks::{InMemoryRegistry, InMemoryStore, MockPlatform, PlatformScript};

fn engine(registry: InMemoryRegistry, store: InMemoryStore, platform: MockPlatform) -> SyncEngine {
    SyncEngine::with_components(
        Arc::new(registry),
        Arc::new(store),
        Arc::new(platform),
        Arc::new(FixedClock(chrono::Utc::now())),
        WorkerConfig {
            inter_account_delay: Duration::from_millis(1),
            ..WorkerConfig::default()
        },
    )
}

/// Poll until the condition holds or a deadline passes.
async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within deadline");
}

#[tokio::test]
async fn one_failing_account_never_aborts_the_batch() {
    let store = InMemoryStore::new();
    let registry = InMemoryRegistry::new(vec![
        account("shop-a"),
        account("shop-b"),
        account("shop-c"),
    ]);

    let platform = MockPlatform::new();
    platform.script(
        "shop-a",
        PlatformScript::Range(ReportPayload::Daily(aggregates("shop-a", 1, 3))),
    );
    platform.script("shop-b", PlatformScript::Fail);
    platform.script(
        "shop-c",
        PlatformScript::Range(ReportPayload::Daily(aggregates("shop-c", 1, 3))),
    );

    let store_probe = store.clone();
    let engine = engine(registry, store, platform);

    let ids: Vec<String> = ["shop-a", "shop-b", "shop-c"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    engine.synchronize(&ids, range(1, 3)).await.unwrap();

    wait_for(|| store_probe.row_count() == 6).await;
    assert!(store_probe
        .row("shop-c", integration_tests::fixtures::date(3))
        .is_some());

    wait_for(|| !engine.batch_reports().is_empty()).await;
    let reports = engine.batch_reports();
    let outcomes = &reports[0].outcomes;
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].succeeded());
    assert!(!outcomes[1].succeeded());
    assert!(outcomes[2].succeeded(), "third account runs after the second fails");
    assert_eq!(outcomes[0].days_written, 3);
    assert_eq!(outcomes[1].days_written, 0);
}

#[tokio::test]
async fn batch_accounts_are_called_in_caller_order() {
    let registry = InMemoryRegistry::new(vec![
        account("shop-a"),
        account("shop-b"),
        account("shop-c"),
    ]);
    let platform = MockPlatform::new();
    let platform_probe = platform.clone();
    let engine = engine(registry, InMemoryStore::new(), platform);

    let ids: Vec<String> = ["shop-c", "shop-a", "shop-b"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    engine.synchronize(&ids, range(1, 2)).await.unwrap();

    wait_for(|| platform_probe.range_calls().len() == 3).await;
    assert_eq!(platform_probe.range_calls(), vec!["shop-c", "shop-a", "shop-b"]);
}

#[tokio::test]
async fn credential_rejection_marks_the_account_inactive() {
    let registry = InMemoryRegistry::new(vec![account("shop-a"), account("shop-b")]);
    let registry_probe = registry.clone();

    let platform = MockPlatform::new();
    platform.script("shop-a", PlatformScript::RejectCredential);
    platform.script(
        "shop-b",
        PlatformScript::Range(ReportPayload::Daily(aggregates("shop-b", 1, 2))),
    );

    let engine = engine(registry, InMemoryStore::new(), platform);
    let ids: Vec<String> = ["shop-a", "shop-b"].iter().map(|s| s.to_string()).collect();
    engine.synchronize(&ids, range(1, 2)).await.unwrap();

    wait_for(|| {
        registry_probe.account("shop-a").unwrap().stored_status == StoredStatus::Inactive
            && registry_probe.account("shop-b").unwrap().stored_status == StoredStatus::Active
    })
    .await;

    wait_for(|| !engine.batch_reports().is_empty()).await;
    let reports = engine.batch_reports();
    assert!(reports[0].outcomes[0].credential_failure);
    assert!(!reports[0].outcomes[1].credential_failure);
}

#[tokio::test]
async fn shutdown_waits_for_the_worker_to_stop() {
    let registry = InMemoryRegistry::new(vec![account("shop-a")]);
    let platform = MockPlatform::new();
    platform.script(
        "shop-a",
        PlatformScript::Range(ReportPayload::Daily(aggregates("shop-a", 1, 2))),
    );

    let store = InMemoryStore::new();
    let store_probe = store.clone();
    let engine = engine(registry, store, platform);

    engine
        .synchronize(&["shop-a".to_string()], range(1, 2))
        .await
        .unwrap();
    wait_for(|| store_probe.row_count() == 2).await;

    tokio::time::timeout(Duration::from_secs(5), engine.shutdown())
        .await
        .expect("shutdown must complete once the queue is closed");
}

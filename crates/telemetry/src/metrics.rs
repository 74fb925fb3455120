//! Internal metrics collection.
//!
//! Counters for the read and repair paths, collected in-memory. Snapshots
//! are cheap and can be logged or shipped by an embedding service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the reconciliation engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Phase 1 (read path)
    pub sync_requests: Counter,
    pub accounts_reported: Counter,
    pub store_reads: Counter,
    pub store_read_errors: Counter,
    pub degraded_accounts: Counter,
    pub gaps_detected: Counter,

    // Phase 2 (repair path)
    pub batches_enqueued: Counter,
    pub batches_dropped: Counter,
    pub batches_processed: Counter,
    pub accounts_synced: Counter,
    pub accounts_failed: Counter,
    pub days_upserted: Counter,

    // External platform
    pub platform_calls: Counter,
    pub platform_call_errors: Counter,
    pub credential_rejections: Counter,

    // Manual refresh
    pub refreshes: Counter,
    pub refresh_fallbacks: Counter,

    // Latency histograms
    pub store_query_latency_ms: Histogram,
    pub platform_call_latency_ms: Histogram,

    // Gauges
    pub queue_depth: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub sync_requests: u64,
    pub accounts_reported: u64,
    pub store_reads: u64,
    pub store_read_errors: u64,
    pub degraded_accounts: u64,
    pub gaps_detected: u64,
    pub batches_enqueued: u64,
    pub batches_dropped: u64,
    pub batches_processed: u64,
    pub accounts_synced: u64,
    pub accounts_failed: u64,
    pub days_upserted: u64,
    pub platform_calls: u64,
    pub platform_call_errors: u64,
    pub credential_rejections: u64,
    pub refreshes: u64,
    pub store_query_latency_mean_ms: f64,
    pub platform_call_latency_mean_ms: f64,
    pub queue_depth: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            sync_requests: self.sync_requests.get(),
            accounts_reported: self.accounts_reported.get(),
            store_reads: self.store_reads.get(),
            store_read_errors: self.store_read_errors.get(),
            degraded_accounts: self.degraded_accounts.get(),
            gaps_detected: self.gaps_detected.get(),
            batches_enqueued: self.batches_enqueued.get(),
            batches_dropped: self.batches_dropped.get(),
            batches_processed: self.batches_processed.get(),
            accounts_synced: self.accounts_synced.get(),
            accounts_failed: self.accounts_failed.get(),
            days_upserted: self.days_upserted.get(),
            platform_calls: self.platform_calls.get(),
            platform_call_errors: self.platform_call_errors.get(),
            credential_rejections: self.credential_rejections.get(),
            refreshes: self.refreshes.get(),
            store_query_latency_mean_ms: self.store_query_latency_ms.mean(),
            platform_call_latency_mean_ms: self.platform_call_latency_ms.mean(),
            queue_depth: self.queue_depth.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}

//! Internal telemetry for the Adlens reconciliation engine.
//!
//! Structured logging via `tracing`, plus an in-process registry of counters
//! and latency histograms that the sync paths update as they run.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;

//! Reconciliation engine: the two-phase sync pipeline.
//!
//! Phase 1 ([`Synchronizer`]) answers from local state only and annotates
//! gaps and session health. Phase 2 ([`SyncWorker`]) repairs gaps in the
//! background, one account at a time. [`Refresher`] is the synchronous
//! single-account variant for callers that need to wait for the result.

pub mod gaps;
pub mod refresh;
pub mod sync;
pub mod worker;

pub use gaps::missing_dates;
pub use refresh::{RefreshResult, Refresher};
pub use sync::{AccountReport, SyncView, Synchronizer};
pub use worker::{
    AccountOutcome, BatchReport, BatchReportLog, SyncBatch, SyncQueue, SyncWorker, WorkerConfig,
};

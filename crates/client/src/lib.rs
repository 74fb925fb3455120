//! Client adapter for the external seller ads platform.
//!
//! Payload shapes and the platform's scaling conventions live entirely in
//! this crate; the core consumes normalized records through the
//! [`AdsPlatform`] trait.

pub mod client;
pub mod config;
pub mod payload;

pub use client::{AdsPlatform, PlatformClient};
pub use config::PlatformConfig;
pub use payload::{RangeTotals, ReportPayload, MONEY_DIVISOR};

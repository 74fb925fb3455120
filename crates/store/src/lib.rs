//! ClickHouse-backed metrics store and account registry.

pub mod client;
pub mod config;
pub mod health;
pub mod schema;
pub mod store;

pub use client::StoreClient;
pub use config::StoreConfig;
pub use store::{AccountRegistry, MetricsStore};

//! ClickHouse table schemas.
//!
//! Both tables are ReplacingMergeTree keyed on their natural key with
//! `updated_at` as the version column: writers racing on the same key
//! resolve to last-write-wins, which is the shared-resource policy for
//! concurrent sync passes. Reads go through FINAL.

/// SQL for creating the daily metrics table.
///
/// One row per (account_id, date); a missing row means "not yet
/// synchronized", not "zero activity". Ratio columns are cached at ingest.
pub const CREATE_DAILY_METRICS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS adlens.daily_metrics (
    account_id String,
    date Date,

    spend Float64,
    revenue_broad Float64,
    revenue_direct Float64,
    clicks UInt64,
    orders UInt64,
    impressions UInt64,
    views UInt64,

    -- Cached ratios, never recomputed on read
    ctr Float64,
    cpc Float64,
    conversion_rate Float64,

    updated_at DateTime64(3)
)
ENGINE = ReplacingMergeTree(updated_at)
PARTITION BY toYYYYMM(date)
ORDER BY (account_id, date)
SETTINGS index_granularity = 8192
"#;

/// SQL for creating the accounts table.
///
/// Mirror of the account registry; status and last_sync_at are the only
/// columns this engine writes.
pub const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS adlens.accounts (
    account_id String,
    credential String,
    stored_status LowCardinality(String),
    last_sync_at Nullable(DateTime64(3)),
    owner_user_id String,
    updated_at DateTime64(3)
)
ENGINE = ReplacingMergeTree(updated_at)
ORDER BY account_id
SETTINGS index_granularity = 8192
"#;

/// SQL for creating the database.
pub const CREATE_DATABASE: &str = r#"
CREATE DATABASE IF NOT EXISTS adlens
"#;

/// All table creation statements.
pub fn all_tables() -> Vec<&'static str> {
    vec![
        CREATE_DATABASE,
        CREATE_DAILY_METRICS_TABLE,
        CREATE_ACCOUNTS_TABLE,
    ]
}

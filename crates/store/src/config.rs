//! Store configuration.

use serde::{Deserialize, Serialize};

/// ClickHouse-backed store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// ClickHouse HTTP URL
    pub url: String,
    /// Database name
    #[serde(default = "default_database")]
    pub database: String,
    /// Username (optional)
    pub username: Option<String>,
    /// Password (optional)
    pub password: Option<String>,
    /// Query timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound for a single Phase-1 read, in seconds. The read path is
    /// bounded by store latency only, so this stays small.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

fn default_database() -> String {
    "adlens".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_read_timeout_secs() -> u64 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".to_string(),
            database: default_database(),
            username: None,
            password: None,
            timeout_secs: default_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

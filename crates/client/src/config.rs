//! Platform client configuration.

use serde::{Deserialize, Serialize};

/// External ad-platform client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the seller ads API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-call timeout in seconds. A timeout is a per-account failure,
    /// never fatal to a batch.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// User-Agent header sent with every call
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:9090".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("adlens-engine/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

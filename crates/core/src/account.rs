//! Account records mirrored from the registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored lifecycle status of an account.
///
/// The registry keeps this as a free-form string; the platform's own labels
/// (including localized ones like "aktif") are folded into `Active` at parse
/// time. Anything unrecognized lands in `Unknown` and is classified from the
/// remaining account state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredStatus {
    Active,
    Inactive,
    Deleted,
    #[serde(other)]
    Unknown,
}

impl StoredStatus {
    /// Parse a registry status string, folding platform synonyms.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "aktif" => Self::Active,
            "inactive" => Self::Inactive,
            "deleted" => Self::Deleted,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Deleted => "deleted",
            Self::Unknown => "unknown",
        }
    }
}

/// One external seller shop tracked by the system.
///
/// The engine never creates or deletes accounts; it only reads them and
/// updates `stored_status` / `last_sync_at` from sync outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Stable external identifier, unique key.
    pub account_id: String,
    /// Opaque session-cookie blob; empty means no usable session.
    pub credential: String,
    pub stored_status: StoredStatus,
    /// Time of the most recent successful external call, if any.
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Registering operator; read-only to the engine.
    pub owner_user_id: Uuid,
}

impl Account {
    pub fn has_credential(&self) -> bool {
        !self.credential.trim().is_empty()
    }

    pub fn is_deleted(&self) -> bool {
        self.stored_status == StoredStatus::Deleted
    }
}

//! Session-health classification.
//!
//! Health is a cheap, synchronous, side-effect-free projection of account
//! state last written by the background worker or a manual refresh. It never
//! calls the external platform, which keeps the read path available when the
//! platform is down.

use serde::{Deserialize, Serialize};

use crate::account::{Account, StoredStatus};

/// Per-account connectivity state derived from stored account state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionHealth {
    Healthy,
    Warning,
    Expired,
    NoCookies,
    NeverTested,
}

impl SessionHealth {
    /// Classify an account. Decision table, first match wins:
    ///
    /// 1. deleted account → `None` (deletion is not a connectivity state;
    ///    callers display "Deleted" and skip all sync actions)
    /// 2. empty credential → `NoCookies`
    /// 3. stored status active → `Healthy`
    /// 4. stored status inactive → `Expired`
    /// 5. never synced → `NeverTested`
    /// 6. otherwise → `Warning` (credential present, status ambiguous)
    pub fn classify(account: &Account) -> Option<Self> {
        if account.is_deleted() {
            return None;
        }
        if !account.has_credential() {
            return Some(Self::NoCookies);
        }
        match account.stored_status {
            StoredStatus::Active => Some(Self::Healthy),
            StoredStatus::Inactive => Some(Self::Expired),
            _ if account.last_sync_at.is_none() => Some(Self::NeverTested),
            _ => Some(Self::Warning),
        }
    }

    /// Whether the account is worth a background repair attempt. Expired and
    /// cookie-less sessions are skipped rather than retried wastefully.
    pub fn sync_eligible(&self) -> bool {
        matches!(self, Self::Healthy | Self::Warning | Self::NeverTested)
    }
}

/// UI-facing label: the session-health values plus the two states callers
/// must special-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLabel {
    Healthy,
    Warning,
    Expired,
    NoCookies,
    NeverTested,
    /// The requested range has missing dates. Gaps are a stronger, more
    /// actionable signal than a stale status, so they override an otherwise
    /// usable session.
    SyncNeeded,
    Deleted,
}

impl HealthLabel {
    /// Derive the label shown for one account in one request.
    pub fn derive(health: Option<SessionHealth>, has_missing_dates: bool) -> Self {
        match health {
            None => Self::Deleted,
            Some(h) if has_missing_dates && h.sync_eligible() => Self::SyncNeeded,
            Some(h) => h.into(),
        }
    }
}

impl From<SessionHealth> for HealthLabel {
    fn from(health: SessionHealth) -> Self {
        match health {
            SessionHealth::Healthy => Self::Healthy,
            SessionHealth::Warning => Self::Warning,
            SessionHealth::Expired => Self::Expired,
            SessionHealth::NoCookies => Self::NoCookies,
            SessionHealth::NeverTested => Self::NeverTested,
        }
    }
}

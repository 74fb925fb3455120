//! Unified error types for the reconciliation engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the reconciliation engine.
///
/// Only `StoreUnavailable` at the top of a Phase-1 read is fatal to the
/// caller; every other condition degrades to a per-account or per-date
/// partial result with an explicit status flag.
#[derive(Debug, Error)]
pub enum Error {
    /// The metrics store or account registry could not be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The account has no usable session credential.
    #[error("no credential stored for account {0}")]
    CredentialMissing(String),

    /// The account is soft-deleted; all sync actions are skipped for it.
    #[error("account {0} is deleted")]
    AccountDeleted(String),

    #[error("unknown account: {0}")]
    AccountNotFound(String),

    /// A call to the external ad platform failed: network error, non-2xx
    /// response, or an unparseable payload.
    #[error("external call failed: {message}")]
    ExternalCall {
        message: String,
        /// True when the platform rejected the session cookie itself.
        credential_failure: bool,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Create an external-call error that does not implicate the credential.
    pub fn external(msg: impl Into<String>) -> Self {
        Self::ExternalCall {
            message: msg.into(),
            credential_failure: false,
        }
    }

    /// Create an external-call error caused by a rejected session cookie.
    pub fn credential_rejected(msg: impl Into<String>) -> Self {
        Self::ExternalCall {
            message: msg.into(),
            credential_failure: true,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error means the account's session is unusable, as opposed
    /// to a transient platform or network problem.
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            Self::CredentialMissing(_)
                | Self::ExternalCall {
                    credential_failure: true,
                    ..
                }
        )
    }
}

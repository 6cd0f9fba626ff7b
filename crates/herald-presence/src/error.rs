//! Error types for the presence module.

use thiserror::Error;

/// Errors that can occur during presence reconciliation.
#[derive(Debug, Error)]
pub enum PresenceError {
    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] herald_store::StoreError),

    /// Shard math failed (bad shard count).
    #[error("shard error: {0}")]
    Shard(#[from] herald_core::CoreError),
}

/// Result type for presence operations.
pub type Result<T> = std::result::Result<T, PresenceError>;

//! Error types for the Runtime.

use herald_core::CoreError;
use herald_presence::PresenceError;
use herald_script::ScriptError;
use herald_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Runtime operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Core computation error (lookup failures, invalid shard count).
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Presence reconciliation error.
    #[error("presence error: {0}")]
    Presence(#[from] PresenceError),

    /// Script execution error.
    #[error("script error: {0}")]
    Script(#[from] ScriptError),
}

/// Result type for Runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

//! Error types for script execution.

use thiserror::Error;

/// Errors surfaced to the user-facing layer from a script invocation.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script failed to parse.
    #[error("failed parsing script: {message}")]
    Syntax { message: String },

    /// The script failed mid-execution. Whatever output was already
    /// rendered is preserved, sanitized, in `partial`.
    #[error("failed executing script: {message}")]
    Runtime { message: String, partial: String },

    /// Engine failure while setting up bindings, before any user code ran.
    #[error("binding error: {0}")]
    Binding(#[from] mlua::Error),
}

/// Result type for script operations.
pub type Result<T> = std::result::Result<T, ScriptError>;

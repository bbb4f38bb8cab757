//! Crate-wide error type.

use thiserror::Error;

use crate::search::SearchStatus;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the selection engine.
///
/// Configuration errors are reported before a search enters
/// [`SearchStatus::Running`]. Internal errors signal a broken invariant
/// and always indicate a bug in this crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Invalid configuration or input data.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A broken internal invariant.
    #[error("internal error (bug): {0}")]
    Internal(String),

    /// A lifecycle operation was attempted in the wrong state.
    #[error("search is {actual}, expected {expected}")]
    InvalidState {
        /// State required by the operation.
        expected: SearchStatus,
        /// State the search was actually in.
        actual: SearchStatus,
    },
}

impl CoreError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        CoreError::Config(msg.into())
    }

    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        CoreError::Internal(msg.into())
    }
}

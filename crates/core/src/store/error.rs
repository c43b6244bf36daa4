//! Storage error types.

use thiserror::Error;

/// Errors reported by storage implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unit of work could not be started.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A read was rejected by the storage engine.
    #[error("storage read failed: {0}")]
    ReadFailed(String),

    /// A write or commit was rejected by the storage engine.
    #[error("storage write failed: {0}")]
    WriteFailed(String),

    /// A balance update matched no account.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// An account with this uid already exists.
    #[error("account already exists: {0}")]
    DuplicateAccount(String),

    /// An operation was issued through a scope that was already closed.
    #[error("scope already closed")]
    ScopeClosed,
}

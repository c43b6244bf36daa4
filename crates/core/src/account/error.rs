//! Account management errors.

use tally_shared::AppError;
use thiserror::Error;

use crate::store::StoreError;
use crate::validation::ValidationError;

/// Errors from account creation and listing.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Input failed validation.
    #[error("failed to validate account: {0}")]
    Validation(#[from] ValidationError),

    /// The uid is already taken.
    #[error("account already exists: {0}")]
    Duplicate(String),

    /// The store rejected the operation.
    #[error("failed to {operation}: {source}")]
    Storage {
        /// What was being attempted.
        operation: &'static str,
        /// The underlying storage failure.
        #[source]
        source: StoreError,
    },
}

impl AccountError {
    pub(crate) fn storage(operation: &'static str, source: StoreError) -> Self {
        match source {
            StoreError::DuplicateAccount(uid) => Self::Duplicate(uid),
            source => Self::Storage { operation, source },
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(e) => Self::Validation(e.to_string()),
            AccountError::Duplicate(uid) => Self::Conflict(format!("account {uid} already exists")),
            err @ AccountError::Storage { .. } => Self::Database(err.to_string()),
        }
    }
}

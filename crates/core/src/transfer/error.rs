//! Transfer error types.

use std::time::Duration;

use tally_shared::AppError;
use thiserror::Error;

use super::types::TransferStep;
use crate::store::StoreError;
use crate::validation::ValidationError;

/// Who is at fault for a failed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; retrying the same request will fail again.
    Client,
    /// Storage or infrastructure failure.
    Server,
}

/// Errors that can occur while executing a transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// One or more fields failed validation. Storage was not touched.
    #[error("invalid transfer: {0}")]
    Validation(#[from] ValidationError),

    /// A storage step failed and the transfer was rolled back.
    #[error("failed to {step}: {source}")]
    Storage {
        /// The step that failed.
        step: TransferStep,
        /// The underlying storage failure.
        #[source]
        source: StoreError,
    },

    /// A balance update matched no account.
    #[error("account {0} not found")]
    AccountNotFound(String),

    /// The transfer did not finish before its deadline.
    #[error("transfer timed out after {0:?}")]
    Timeout(Duration),
}

impl TransferError {
    pub(crate) fn at(step: TransferStep, source: StoreError) -> Self {
        match source {
            StoreError::AccountNotFound(uid) => Self::AccountNotFound(uid),
            source => Self::Storage { step, source },
        }
    }

    /// Classifies the failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::AccountNotFound(_) => ErrorKind::Client,
            Self::Storage { .. } | Self::Timeout(_) => ErrorKind::Server,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::Timeout(_) => "TIMEOUT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::AccountNotFound(_) => 404,
            Self::Storage { .. } | Self::Timeout(_) => 500,
        }
    }
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Validation(e) => Self::Validation(e.to_string()),
            err @ TransferError::AccountNotFound(_) => Self::NotFound(err.to_string()),
            err @ TransferError::Storage { .. } => Self::Database(err.to_string()),
            err @ TransferError::Timeout(_) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Validator;

    fn validation_error() -> TransferError {
        let mut v = Validator::new();
        v.uid("payer_uid", "");
        TransferError::Validation(v.finish().unwrap_err())
    }

    #[test]
    fn test_kind() {
        assert_eq!(validation_error().kind(), ErrorKind::Client);
        assert_eq!(
            TransferError::AccountNotFound("ghost".into()).kind(),
            ErrorKind::Client
        );
        assert_eq!(
            TransferError::Timeout(Duration::from_secs(1)).kind(),
            ErrorKind::Server
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(validation_error().http_status_code(), 400);
        assert_eq!(
            TransferError::AccountNotFound("ghost".into()).http_status_code(),
            404
        );
        assert_eq!(
            TransferError::at(TransferStep::Commit, StoreError::WriteFailed("io".into()))
                .http_status_code(),
            500
        );
    }

    #[test]
    fn test_missing_account_is_lifted() {
        let err = TransferError::at(
            TransferStep::CreditRecipient,
            StoreError::AccountNotFound("bob".into()),
        );
        assert!(matches!(err, TransferError::AccountNotFound(uid) if uid == "bob"));
    }

    #[test]
    fn test_storage_error_names_step() {
        let err = TransferError::at(
            TransferStep::InsertMirrorEntry,
            StoreError::WriteFailed("disk full".into()),
        );
        assert_eq!(
            err.to_string(),
            "failed to insert mirror payment: storage write failed: disk full"
        );
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = TransferError::AccountNotFound("bob".into()).into();
        assert_eq!(app.status_code(), 404);

        let app: AppError = validation_error().into();
        assert_eq!(app.status_code(), 400);
        assert_eq!(
            app.to_string(),
            "Validation error: field payer_uid should be a non-empty string, empty string detected"
        );
    }
}

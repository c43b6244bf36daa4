//! Transfer execution.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use super::error::TransferError;
use super::types::{TransferRequest, TransferStage, TransferStep};
use crate::ledger::{LedgerEntry, NewLedgerEntry};
use crate::store::{Scope, ScopeFactory, Storage};

/// Executes transfers against a [`Storage`].
///
/// Every execution validates all input before storage is touched, then
/// runs its storage steps in a fixed order inside one scope:
///
/// 1. insert the forward entry `(payer, recipient, +amount)`
/// 2. insert the mirror entry `(recipient, payer, -amount)`
/// 3. add `-amount` to the payer
/// 4. add `+amount` to the recipient
/// 5. commit
///
/// A rollback is attempted afterwards whatever the outcome. After a
/// successful commit it does nothing. A failed rollback is logged and never
/// replaces the result.
pub struct TransferEngine<S> {
    storage: Arc<S>,
    timeout: Duration,
}

impl<S> Clone for TransferEngine<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            timeout: self.timeout,
        }
    }
}

impl<S: Storage> TransferEngine<S> {
    /// Creates an engine whose executions must finish within `timeout`.
    #[must_use]
    pub const fn new(storage: Arc<S>, timeout: Duration) -> Self {
        Self { storage, timeout }
    }

    /// Deadline applied to each execution.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Moves `request.amount` from the payer to the recipient.
    ///
    /// Returns the stored forward entry.
    ///
    /// # Errors
    ///
    /// - [`TransferError::Validation`] with every violated field. No storage
    ///   call is made.
    /// - [`TransferError::AccountNotFound`] if either account does not exist.
    /// - [`TransferError::Storage`] naming the failed step.
    /// - [`TransferError::Timeout`] if the deadline expires.
    ///
    /// On any error other than a timeout nothing is persisted. The deadline
    /// also covers commit, so a timeout that fires while the commit is in
    /// flight on a remote store is ambiguous: the commit may already have
    /// landed. Callers that must know the outcome should re-read the ledger.
    pub async fn execute(&self, request: &TransferRequest) -> Result<LedgerEntry, TransferError> {
        if let Err(e) = request.validate() {
            debug!(
                stage = %TransferStage::Rejected,
                payer = %request.payer,
                recipient = %request.recipient,
                "Transfer rejected"
            );
            return Err(e.into());
        }

        let deadline = Instant::now() + self.timeout;

        let scope = match timeout_at(deadline, self.storage.begin()).await {
            Ok(Ok(scope)) => scope,
            Ok(Err(e)) => return Err(TransferError::at(TransferStep::Begin, e)),
            Err(_) => return Err(TransferError::Timeout(self.timeout)),
        };
        let mut stage = TransferStage::ScopeOpen;

        let result = timeout_at(deadline, self.run(&scope, request, &mut stage))
            .await
            .unwrap_or(Err(TransferError::Timeout(self.timeout)));

        if let Err(e) = scope.rollback().await {
            warn!(error = %e, %stage, "Failed to roll back transfer");
        }

        match &result {
            Ok(entry) => info!(
                id = entry.id,
                payer = %entry.payer_uid,
                recipient = %entry.recipient_uid,
                amount = entry.amount,
                "Transfer committed"
            ),
            Err(e) => debug!(
                error = %e,
                last_stage = %stage,
                stage = %TransferStage::RolledBack,
                "Transfer rolled back"
            ),
        }

        result
    }

    async fn run(
        &self,
        scope: &<S as ScopeFactory>::Scope,
        request: &TransferRequest,
        stage: &mut TransferStage,
    ) -> Result<LedgerEntry, TransferError> {
        let forward = NewLedgerEntry::forward(
            &request.payer,
            &request.recipient,
            request.amount,
            Utc::now(),
        );
        let mirror = forward.mirror();

        let entry = self
            .storage
            .insert_entry(Some(scope), forward)
            .await
            .map_err(|e| TransferError::at(TransferStep::InsertForwardEntry, e))?;
        self.storage
            .insert_entry(Some(scope), mirror)
            .await
            .map_err(|e| TransferError::at(TransferStep::InsertMirrorEntry, e))?;
        *stage = TransferStage::EntriesWritten;

        self.storage
            .increment_balance(Some(scope), &request.payer, -request.amount)
            .await
            .map_err(|e| TransferError::at(TransferStep::DebitPayer, e))?;
        self.storage
            .increment_balance(Some(scope), &request.recipient, request.amount)
            .await
            .map_err(|e| TransferError::at(TransferStep::CreditRecipient, e))?;
        *stage = TransferStage::BalancesUpdated;

        scope
            .commit()
            .await
            .map_err(|e| TransferError::at(TransferStep::Commit, e))?;
        *stage = TransferStage::Committed;

        Ok(entry)
    }
}

//! Transfer input and lifecycle types.

use std::fmt;

use crate::validation::{ValidationError, Validator};

/// Caller input for one transfer. Amount is in minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Account the amount leaves.
    pub payer: String,
    /// Account the amount arrives at.
    pub recipient: String,
    /// Amount in minor units.
    pub amount: i64,
}

impl TransferRequest {
    /// Creates a transfer request.
    #[must_use]
    pub fn new(payer: impl Into<String>, recipient: impl Into<String>, amount: i64) -> Self {
        Self {
            payer: payer.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Checks every field and reports all violations together.
    ///
    /// A transfer from an account to itself is not rejected.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        v.amount(self.amount)
            .uid("payer_uid", &self.payer)
            .uid("recipient_uid", &self.recipient);
        v.finish()
    }
}

/// Where a transfer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    /// Input received, not yet checked.
    Collecting,
    /// Every field passed validation.
    Validated,
    /// A unit of work is open.
    ScopeOpen,
    /// Both ledger legs are staged.
    EntriesWritten,
    /// Both balances are staged.
    BalancesUpdated,
    /// The unit of work is committed.
    Committed,
    /// Validation failed; storage was never touched.
    Rejected,
    /// A step failed or the deadline expired; nothing was persisted.
    RolledBack,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Collecting => "collecting",
            Self::Validated => "validated",
            Self::ScopeOpen => "scope_open",
            Self::EntriesWritten => "entries_written",
            Self::BalancesUpdated => "balances_updated",
            Self::Committed => "committed",
            Self::Rejected => "rejected",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(s)
    }
}

/// A storage step of a transfer, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStep {
    /// Open the unit of work.
    Begin,
    /// Insert `payer -> recipient, +amount`.
    InsertForwardEntry,
    /// Insert `recipient -> payer, -amount`.
    InsertMirrorEntry,
    /// Add `-amount` to the payer.
    DebitPayer,
    /// Add `+amount` to the recipient.
    CreditRecipient,
    /// Commit the unit of work.
    Commit,
}

impl fmt::Display for TransferStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Begin => "begin transfer",
            Self::InsertForwardEntry => "insert payment",
            Self::InsertMirrorEntry => "insert mirror payment",
            Self::DebitPayer => "debit payer",
            Self::CreditRecipient => "credit recipient",
            Self::Commit => "commit transfer",
        };
        f.write_str(s)
    }
}

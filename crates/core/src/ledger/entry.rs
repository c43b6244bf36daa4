//! Ledger entry model.

use chrono::{DateTime, Utc};

/// One stored leg of a transfer. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Storage-assigned identity.
    pub id: i64,
    /// Signed amount in minor units.
    pub amount: i64,
    /// Account the amount leaves.
    pub payer_uid: String,
    /// Account the amount arrives at.
    pub recipient_uid: String,
    /// When the transfer was executed.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns true if `other` is the sign-inverted, direction-swapped
    /// counterpart of this entry.
    #[must_use]
    pub fn is_mirror_of(&self, other: &Self) -> bool {
        self.payer_uid == other.recipient_uid
            && self.recipient_uid == other.payer_uid
            && self.amount == -other.amount
            && self.created_at == other.created_at
    }
}

/// A ledger entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    /// Signed amount in minor units.
    pub amount: i64,
    /// Account the amount leaves.
    pub payer_uid: String,
    /// Account the amount arrives at.
    pub recipient_uid: String,
    /// When the transfer was executed.
    pub created_at: DateTime<Utc>,
}

impl NewLedgerEntry {
    /// The forward leg: `payer -> recipient, +amount`.
    #[must_use]
    pub fn forward(payer: &str, recipient: &str, amount: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            amount,
            payer_uid: payer.to_string(),
            recipient_uid: recipient.to_string(),
            created_at,
        }
    }

    /// The mirror leg: direction swapped, sign inverted, same timestamp.
    #[must_use]
    pub fn mirror(&self) -> Self {
        Self {
            amount: -self.amount,
            payer_uid: self.recipient_uid.clone(),
            recipient_uid: self.payer_uid.clone(),
            created_at: self.created_at,
        }
    }

    /// Attaches the storage identity.
    #[must_use]
    pub fn stored(self, id: i64) -> LedgerEntry {
        LedgerEntry {
            id,
            amount: self.amount,
            payer_uid: self.payer_uid,
            recipient_uid: self.recipient_uid,
            created_at: self.created_at,
        }
    }
}

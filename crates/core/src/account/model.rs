//! Account model.

use chrono::{DateTime, Utc};

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Storage-assigned identity.
    pub id: i64,
    /// Caller-assigned unique identifier.
    pub uid: String,
    /// Upper-cased currency code.
    pub currency: String,
    /// Cached balance in minor units.
    pub balance: i64,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
}

/// An account that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Caller-assigned unique identifier.
    pub uid: String,
    /// Upper-cased currency code.
    pub currency: String,
    /// Opening balance in minor units.
    pub balance: i64,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
}

impl NewAccount {
    /// Attaches the storage identity.
    #[must_use]
    pub fn stored(self, id: i64) -> Account {
        Account {
            id,
            uid: self.uid,
            currency: self.currency,
            balance: self.balance,
            created_at: self.created_at,
        }
    }
}

/// Caller input for opening an account.
#[derive(Debug, Clone)]
pub struct CreateAccountRequest {
    /// Caller-assigned unique identifier.
    pub uid: String,
    /// Currency code, any case.
    pub currency: String,
    /// Opening balance in minor units.
    pub balance: i64,
}

//! Account creation and read-only listings.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::error::AccountError;
use super::model::{Account, CreateAccountRequest, NewAccount};
use crate::ledger::LedgerEntry;
use crate::store::{AccountStore, LedgerStore};
use crate::validation::Validator;

/// Opens accounts and lists accounts and payments.
///
/// None of these operations need a unit of work: each is a single
/// statement run directly against the store.
pub struct AccountManager<S> {
    storage: Arc<S>,
}

impl<S> Clone for AccountManager<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S> AccountManager<S>
where
    S: AccountStore + LedgerStore,
{
    /// Creates a new account manager over `storage`.
    #[must_use]
    pub const fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Validates and stores a new account.
    ///
    /// The currency is upper-cased before it is stored.
    pub async fn create_account(
        &self,
        request: CreateAccountRequest,
    ) -> Result<Account, AccountError> {
        let mut v = Validator::new();
        v.uid("uid", &request.uid)
            .balance(request.balance)
            .currency(&request.currency);
        v.finish()?;

        let account = NewAccount {
            uid: request.uid,
            currency: request.currency.to_uppercase(),
            balance: request.balance,
            created_at: Utc::now(),
        };

        let account = self
            .storage
            .insert_account(None, account)
            .await
            .map_err(|e| AccountError::storage("create account", e))?;

        info!(uid = %account.uid, balance = account.balance, "Account created");
        Ok(account)
    }

    /// Returns every account.
    pub async fn all_accounts(&self) -> Result<Vec<Account>, AccountError> {
        self.storage
            .list_accounts(None)
            .await
            .map_err(|e| AccountError::storage("get accounts", e))
    }

    /// Returns every stored ledger entry, forward and mirror legs alike.
    pub async fn all_payments(&self) -> Result<Vec<LedgerEntry>, AccountError> {
        self.storage
            .list_entries(None)
            .await
            .map_err(|e| AccountError::storage("get payments", e))
    }
}

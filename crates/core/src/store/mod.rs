//! Storage capability traits.
//!
//! The engine never touches a storage engine directly. It begins a
//! [`Scope`] through a [`ScopeFactory`] and passes that scope explicitly
//! into every [`AccountStore`] and [`LedgerStore`] call. Passing `None`
//! runs the call as its own implicit unit of work.
//!
//! Two implementations exist: the PostgreSQL store in `tally-db` and
//! [`memory::MemoryStorage`], an in-process store with injectable failures.

pub mod error;
pub mod memory;

use async_trait::async_trait;

pub use error::StoreError;

use crate::account::{Account, NewAccount};
use crate::ledger::{LedgerEntry, NewLedgerEntry};

/// One transactional boundary.
///
/// At most one of `commit` / `rollback` has an effect. Every later close
/// call returns `Ok(())` without doing anything. Dropping an open scope
/// discards its work.
#[async_trait]
pub trait Scope: Send + Sync {
    /// Finalizes every operation performed under this scope.
    async fn commit(&self) -> Result<(), StoreError>;

    /// Discards every operation performed under this scope.
    async fn rollback(&self) -> Result<(), StoreError>;
}

/// Opens units of work.
#[async_trait]
pub trait ScopeFactory: Send + Sync {
    /// The scope type threaded through store calls.
    type Scope: Scope;

    /// Starts a new unit of work.
    async fn begin(&self) -> Result<Self::Scope, StoreError>;
}

/// Account persistence.
#[async_trait]
pub trait AccountStore: ScopeFactory {
    /// Returns every stored account, oldest first.
    async fn list_accounts(&self, scope: Option<&Self::Scope>)
    -> Result<Vec<Account>, StoreError>;

    /// Persists a new account and returns it with its storage identity.
    async fn insert_account(
        &self,
        scope: Option<&Self::Scope>,
        account: NewAccount,
    ) -> Result<Account, StoreError>;

    /// Adds `delta` (possibly negative) to the balance of `uid` in a single
    /// storage-level update, never by reading and writing back.
    async fn increment_balance(
        &self,
        scope: Option<&Self::Scope>,
        uid: &str,
        delta: i64,
    ) -> Result<(), StoreError>;
}

/// Ledger entry persistence. Entries are only ever inserted.
#[async_trait]
pub trait LedgerStore: ScopeFactory {
    /// Returns every stored entry, oldest first.
    async fn list_entries(
        &self,
        scope: Option<&Self::Scope>,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Persists a new entry and returns it with its storage identity.
    async fn insert_entry(
        &self,
        scope: Option<&Self::Scope>,
        entry: NewLedgerEntry,
    ) -> Result<LedgerEntry, StoreError>;
}

/// Everything the transfer engine needs from storage.
pub trait Storage: AccountStore + LedgerStore {}

impl<T: AccountStore + LedgerStore> Storage for T {}

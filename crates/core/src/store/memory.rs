//! In-process storage with injectable faults.
//!
//! Writes issued under a scope are staged in that scope's operation log and
//! replayed onto the committed state on `commit`. Reads through a scope see
//! the committed state plus the scope's own staged writes. Identities are
//! allocated when a write is staged, so a rolled-back scope leaves gaps, the
//! same way database sequences do.
//!
//! Every call is appended to a call journal (see [`MemoryStorage::calls`])
//! before any fault is applied, which lets tests assert on ordering and on
//! storage never being touched.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{AccountStore, LedgerStore, Scope, ScopeFactory, StoreError};
use crate::account::{Account, NewAccount};
use crate::ledger::{LedgerEntry, NewLedgerEntry};

/// A point in the storage protocol where a fault can be injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailPoint {
    /// Starting a scope.
    Begin,
    /// Committing a scope.
    Commit,
    /// Rolling back a scope that is still open.
    Rollback,
    /// Listing accounts or entries.
    Read,
    /// Inserting an account.
    InsertAccount,
    /// The n-th ledger entry insert on this store, counting from zero.
    InsertEntry(usize),
    /// Incrementing the balance of this uid.
    IncrementBalance(String),
}

/// A call received by the store, recorded in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `begin`
    Begin,
    /// `commit`
    Commit,
    /// `rollback`
    Rollback,
    /// `list_accounts`
    ListAccounts,
    /// `list_entries`
    ListEntries,
    /// `insert_account`
    InsertAccount(String),
    /// `insert_entry`
    InsertEntry {
        /// Payer of the entry.
        payer: String,
        /// Recipient of the entry.
        recipient: String,
        /// Signed amount.
        amount: i64,
    },
    /// `increment_balance`
    IncrementBalance {
        /// Target account.
        uid: String,
        /// Signed delta.
        delta: i64,
    },
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    Fail,
    Stall(Duration),
}

#[derive(Debug, Clone)]
enum Op {
    InsertAccount(Account),
    InsertEntry(LedgerEntry),
    Increment { uid: String, delta: i64 },
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    accounts: Vec<Account>,
    entries: Vec<LedgerEntry>,
}

impl Snapshot {
    fn apply(&mut self, op: &Op) -> Result<(), StoreError> {
        match op {
            Op::InsertAccount(account) => {
                if self.accounts.iter().any(|a| a.uid == account.uid) {
                    return Err(StoreError::DuplicateAccount(account.uid.clone()));
                }
                self.accounts.push(account.clone());
            }
            Op::InsertEntry(entry) => self.entries.push(entry.clone()),
            Op::Increment { uid, delta } => {
                let account = self
                    .accounts
                    .iter_mut()
                    .find(|a| &a.uid == uid)
                    .ok_or_else(|| StoreError::AccountNotFound(uid.clone()))?;
                account.balance = account
                    .balance
                    .checked_add(*delta)
                    .ok_or_else(|| StoreError::WriteFailed(format!("balance overflow for {uid}")))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Inner {
    committed: Snapshot,
    faults: Vec<(FailPoint, Fault)>,
    calls: Vec<Call>,
    entry_inserts: usize,
    last_account_id: i64,
    last_entry_id: i64,
}

impl Inner {
    fn fault_at(&self, point: &FailPoint) -> Option<Fault> {
        self.faults
            .iter()
            .find(|(p, _)| p == point)
            .map(|(_, fault)| *fault)
    }

    /// The state as seen through `scope`.
    async fn view(&self, scope: Option<&MemoryScope>) -> Result<Snapshot, StoreError> {
        let mut view = self.committed.clone();
        if let Some(scope) = scope {
            let pending = scope.pending.lock().await;
            for op in pending.as_ref().ok_or(StoreError::ScopeClosed)? {
                view.apply(op)?;
            }
        }
        Ok(view)
    }

    /// Applies `op` directly, or stages it in `scope` after checking it
    /// against the scope's view.
    async fn stage(&mut self, scope: Option<&MemoryScope>, op: Op) -> Result<(), StoreError> {
        let Some(scope) = scope else {
            return self.committed.apply(&op);
        };

        let mut pending = scope.pending.lock().await;
        let ops = pending.as_mut().ok_or(StoreError::ScopeClosed)?;
        let mut view = self.committed.clone();
        for staged in ops.iter() {
            view.apply(staged)?;
        }
        view.apply(&op)?;
        ops.push(op);
        Ok(())
    }
}

/// In-memory implementation of every storage capability.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStorage {
    /// Creates an empty store with no faults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call reaching `point` fail.
    pub async fn fail_on(&self, point: FailPoint) {
        self.inner.lock().await.faults.push((point, Fault::Fail));
    }

    /// Makes every call reaching `point` sleep for `duration` first.
    pub async fn stall_on(&self, point: FailPoint, duration: Duration) {
        self.inner
            .lock()
            .await
            .faults
            .push((point, Fault::Stall(duration)));
    }

    /// Removes every injected fault.
    pub async fn clear_faults(&self) {
        self.inner.lock().await.faults.clear();
    }

    /// Opens an account directly in committed state, bypassing the journal.
    pub async fn seed_account(&self, uid: &str, balance: i64) -> Account {
        let mut inner = self.inner.lock().await;
        inner.last_account_id += 1;
        let account = NewAccount {
            uid: uid.to_string(),
            currency: "USD".to_string(),
            balance,
            created_at: chrono::Utc::now(),
        }
        .stored(inner.last_account_id);
        inner.committed.accounts.push(account.clone());
        account
    }

    /// Committed balance of `uid`, if the account exists.
    pub async fn balance(&self, uid: &str) -> Option<i64> {
        self.inner
            .lock()
            .await
            .committed
            .accounts
            .iter()
            .find(|a| a.uid == uid)
            .map(|a| a.balance)
    }

    /// Committed ledger entries.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.inner.lock().await.committed.entries.clone()
    }

    /// Every call received so far, in arrival order.
    pub async fn calls(&self) -> Vec<Call> {
        self.inner.lock().await.calls.clone()
    }

    async fn record(&self, call: Call) {
        self.inner.lock().await.calls.push(call);
    }

    async fn reach(
        &self,
        point: &FailPoint,
        error: impl FnOnce(String) -> StoreError,
    ) -> Result<(), StoreError> {
        reach(&self.inner, point, error).await
    }
}

/// Applies whatever fault is registered at `point`. The lock is not held
/// while stalling.
async fn reach(
    inner: &Mutex<Inner>,
    point: &FailPoint,
    error: impl FnOnce(String) -> StoreError,
) -> Result<(), StoreError> {
    let fault = inner.lock().await.fault_at(point);
    match fault {
        Some(Fault::Fail) => Err(error(format!("injected failure at {point:?}"))),
        Some(Fault::Stall(duration)) => {
            tokio::time::sleep(duration).await;
            Ok(())
        }
        None => Ok(()),
    }
}

/// A unit of work over [`MemoryStorage`].
#[derive(Debug)]
pub struct MemoryScope {
    inner: Arc<Mutex<Inner>>,
    /// `None` once the scope has been committed or rolled back.
    pending: Mutex<Option<Vec<Op>>>,
}

impl MemoryScope {
    async fn record(&self, call: Call) {
        self.inner.lock().await.calls.push(call);
    }
}

#[async_trait]
impl Scope for MemoryScope {
    async fn commit(&self) -> Result<(), StoreError> {
        self.record(Call::Commit).await;

        let Some(ops) = self.pending.lock().await.take() else {
            return Ok(());
        };

        reach(&self.inner, &FailPoint::Commit, StoreError::WriteFailed).await?;

        let mut inner = self.inner.lock().await;
        let mut next = inner.committed.clone();
        for op in &ops {
            next.apply(op)?;
        }
        inner.committed = next;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        self.record(Call::Rollback).await;

        if self.pending.lock().await.take().is_none() {
            return Ok(());
        }

        reach(&self.inner, &FailPoint::Rollback, StoreError::WriteFailed).await
    }
}

#[async_trait]
impl ScopeFactory for MemoryStorage {
    type Scope = MemoryScope;

    async fn begin(&self) -> Result<MemoryScope, StoreError> {
        self.record(Call::Begin).await;
        self.reach(&FailPoint::Begin, StoreError::Unavailable).await?;

        Ok(MemoryScope {
            inner: Arc::clone(&self.inner),
            pending: Mutex::new(Some(Vec::new())),
        })
    }
}

#[async_trait]
impl AccountStore for MemoryStorage {
    async fn list_accounts(&self, scope: Option<&MemoryScope>) -> Result<Vec<Account>, StoreError> {
        self.record(Call::ListAccounts).await;
        self.reach(&FailPoint::Read, StoreError::ReadFailed).await?;

        let view = self.inner.lock().await.view(scope).await?;
        Ok(view.accounts)
    }

    async fn insert_account(
        &self,
        scope: Option<&MemoryScope>,
        account: NewAccount,
    ) -> Result<Account, StoreError> {
        self.record(Call::InsertAccount(account.uid.clone())).await;
        self.reach(&FailPoint::InsertAccount, StoreError::WriteFailed)
            .await?;

        let mut inner = self.inner.lock().await;
        inner.last_account_id += 1;
        let account = account.stored(inner.last_account_id);
        inner
            .stage(scope, Op::InsertAccount(account.clone()))
            .await?;
        Ok(account)
    }

    async fn increment_balance(
        &self,
        scope: Option<&MemoryScope>,
        uid: &str,
        delta: i64,
    ) -> Result<(), StoreError> {
        self.record(Call::IncrementBalance {
            uid: uid.to_string(),
            delta,
        })
        .await;
        self.reach(
            &FailPoint::IncrementBalance(uid.to_string()),
            StoreError::WriteFailed,
        )
        .await?;

        let op = Op::Increment {
            uid: uid.to_string(),
            delta,
        };
        self.inner.lock().await.stage(scope, op).await
    }
}

#[async_trait]
impl LedgerStore for MemoryStorage {
    async fn list_entries(
        &self,
        scope: Option<&MemoryScope>,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        self.record(Call::ListEntries).await;
        self.reach(&FailPoint::Read, StoreError::ReadFailed).await?;

        let view = self.inner.lock().await.view(scope).await?;
        Ok(view.entries)
    }

    async fn insert_entry(
        &self,
        scope: Option<&MemoryScope>,
        entry: NewLedgerEntry,
    ) -> Result<LedgerEntry, StoreError> {
        let index = {
            let mut inner = self.inner.lock().await;
            inner.calls.push(Call::InsertEntry {
                payer: entry.payer_uid.clone(),
                recipient: entry.recipient_uid.clone(),
                amount: entry.amount,
            });
            inner.entry_inserts += 1;
            inner.entry_inserts - 1
        };
        self.reach(&FailPoint::InsertEntry(index), StoreError::WriteFailed)
            .await?;

        let mut inner = self.inner.lock().await;
        inner.last_entry_id += 1;
        let entry = entry.stored(inner.last_entry_id);
        inner.stage(scope, Op::InsertEntry(entry.clone())).await?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(payer: &str, recipient: &str, amount: i64) -> NewLedgerEntry {
        NewLedgerEntry::forward(payer, recipient, amount, Utc::now())
    }

    #[tokio::test]
    async fn test_scoped_writes_invisible_until_commit() {
        let storage = MemoryStorage::new();
        storage.seed_account("A", 100).await;

        let scope = storage.begin().await.unwrap();
        storage
            .increment_balance(Some(&scope), "A", -40)
            .await
            .unwrap();
        storage
            .insert_entry(Some(&scope), entry("A", "B", 40))
            .await
            .unwrap();

        assert_eq!(storage.balance("A").await, Some(100));
        assert!(storage.entries().await.is_empty());
        let through_scope = storage.list_accounts(Some(&scope)).await.unwrap();
        assert_eq!(through_scope[0].balance, 60);

        scope.commit().await.unwrap();

        assert_eq!(storage.balance("A").await, Some(60));
        assert_eq!(storage.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_staged_writes() {
        let storage = MemoryStorage::new();
        storage.seed_account("A", 100).await;

        let scope = storage.begin().await.unwrap();
        storage.increment_balance(Some(&scope), "A", 5).await.unwrap();
        scope.rollback().await.unwrap();

        assert_eq!(storage.balance("A").await, Some(100));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let storage = MemoryStorage::new();
        storage.seed_account("A", 100).await;

        let scope = storage.begin().await.unwrap();
        storage.increment_balance(Some(&scope), "A", 5).await.unwrap();
        scope.commit().await.unwrap();

        assert!(scope.rollback().await.is_ok());
        assert!(scope.rollback().await.is_ok());
        assert!(scope.commit().await.is_ok());
        assert_eq!(storage.balance("A").await, Some(105));
    }

    #[tokio::test]
    async fn test_operations_on_closed_scope_fail() {
        let storage = MemoryStorage::new();
        storage.seed_account("A", 100).await;

        let scope = storage.begin().await.unwrap();
        scope.rollback().await.unwrap();

        assert_eq!(
            storage.increment_balance(Some(&scope), "A", 1).await,
            Err(StoreError::ScopeClosed)
        );
    }

    #[tokio::test]
    async fn test_increment_unknown_account() {
        let storage = MemoryStorage::new();

        assert_eq!(
            storage.increment_balance(None, "ghost", 1).await,
            Err(StoreError::AccountNotFound("ghost".into()))
        );
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_rollback() {
        let storage = MemoryStorage::new();

        let scope = storage.begin().await.unwrap();
        let first = storage
            .insert_entry(Some(&scope), entry("A", "B", 1))
            .await
            .unwrap();
        scope.rollback().await.unwrap();

        let second = storage.insert_entry(None, entry("A", "B", 1)).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_failed_commit_closes_scope() {
        let storage = MemoryStorage::new();
        storage.seed_account("A", 100).await;
        storage.fail_on(FailPoint::Commit).await;

        let scope = storage.begin().await.unwrap();
        storage.increment_balance(Some(&scope), "A", 5).await.unwrap();

        assert!(matches!(scope.commit().await, Err(StoreError::WriteFailed(_))));
        assert!(scope.rollback().await.is_ok());
        assert_eq!(storage.balance("A").await, Some(100));
    }

    #[tokio::test]
    async fn test_injected_begin_failure() {
        let storage = MemoryStorage::new();
        storage.fail_on(FailPoint::Begin).await;

        assert!(matches!(storage.begin().await, Err(StoreError::Unavailable(_))));

        storage.clear_faults().await;
        assert!(storage.begin().await.is_ok());
    }

    #[tokio::test]
    async fn test_calls_are_journaled() {
        let storage = MemoryStorage::new();
        storage.seed_account("A", 0).await;

        let _ = storage.list_accounts(None).await.unwrap();
        storage.increment_balance(None, "A", 7).await.unwrap();

        assert_eq!(
            storage.calls().await,
            vec![
                Call::ListAccounts,
                Call::IncrementBalance {
                    uid: "A".into(),
                    delta: 7
                },
            ]
        );
    }
}

//! PostgreSQL-backed storage.
//!
//! [`PgStorage`] implements the core storage capabilities over a `SeaORM`
//! connection pool. A [`PgScope`] owns one database transaction; store calls
//! made with a scope run on that transaction, calls made without one run
//! directly on the pool.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tokio::sync::Mutex;

use tally_core::account::NewAccount;
use tally_core::{
    Account, AccountStore, LedgerEntry, LedgerStore, NewLedgerEntry, Scope, ScopeFactory,
    StoreError,
};

use crate::entities::{accounts, payments};

/// Storage over a PostgreSQL connection pool.
#[derive(Debug)]
pub struct PgStorage {
    db: DatabaseConnection,
}

impl PgStorage {
    /// Creates a new store over `db`.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// A unit of work over one database transaction.
///
/// The transaction is taken out on the first close. Dropping a scope that
/// was never closed rolls the transaction back.
#[derive(Debug)]
pub struct PgScope {
    txn: Mutex<Option<DatabaseTransaction>>,
}

#[async_trait]
impl Scope for PgScope {
    async fn commit(&self) -> Result<(), StoreError> {
        let Some(txn) = self.txn.lock().await.take() else {
            return Ok(());
        };
        txn.commit().await.map_err(write_failed)
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        let Some(txn) = self.txn.lock().await.take() else {
            return Ok(());
        };
        txn.rollback().await.map_err(write_failed)
    }
}

#[async_trait]
impl ScopeFactory for PgStorage {
    type Scope = PgScope;

    async fn begin(&self) -> Result<PgScope, StoreError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(PgScope {
            txn: Mutex::new(Some(txn)),
        })
    }
}

/// Runs `$op` on the scope's transaction, or on the pool when there is no scope.
macro_rules! on_conn {
    ($self:ident, $scope:expr, |$conn:ident| $op:expr) => {
        match $scope {
            Some(scope) => {
                let guard = scope.txn.lock().await;
                let $conn = guard.as_ref().ok_or(StoreError::ScopeClosed)?;
                $op.await
            }
            None => {
                let $conn = &$self.db;
                $op.await
            }
        }
    };
}

#[async_trait]
impl AccountStore for PgStorage {
    async fn list_accounts(&self, scope: Option<&PgScope>) -> Result<Vec<Account>, StoreError> {
        on_conn!(self, scope, |conn| list_accounts(conn))
    }

    async fn insert_account(
        &self,
        scope: Option<&PgScope>,
        account: NewAccount,
    ) -> Result<Account, StoreError> {
        on_conn!(self, scope, |conn| insert_account(conn, account))
    }

    async fn increment_balance(
        &self,
        scope: Option<&PgScope>,
        uid: &str,
        delta: i64,
    ) -> Result<(), StoreError> {
        on_conn!(self, scope, |conn| increment_balance(conn, uid, delta))
    }
}

#[async_trait]
impl LedgerStore for PgStorage {
    async fn list_entries(&self, scope: Option<&PgScope>) -> Result<Vec<LedgerEntry>, StoreError> {
        on_conn!(self, scope, |conn| list_entries(conn))
    }

    async fn insert_entry(
        &self,
        scope: Option<&PgScope>,
        entry: NewLedgerEntry,
    ) -> Result<LedgerEntry, StoreError> {
        on_conn!(self, scope, |conn| insert_entry(conn, entry))
    }
}

async fn list_accounts<C: ConnectionTrait>(conn: &C) -> Result<Vec<Account>, StoreError> {
    let rows = accounts::Entity::find()
        .order_by_asc(accounts::Column::Id)
        .all(conn)
        .await
        .map_err(read_failed)?;

    Ok(rows.into_iter().map(Account::from).collect())
}

async fn insert_account<C: ConnectionTrait>(
    conn: &C,
    account: NewAccount,
) -> Result<Account, StoreError> {
    let uid = account.uid.clone();
    let model = accounts::ActiveModel {
        uid: Set(account.uid),
        currency: Set(account.currency),
        balance: Set(account.balance),
        created_at: Set(account.created_at.into()),
        ..Default::default()
    };

    match model.insert(conn).await {
        Ok(row) => Ok(row.into()),
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Err(StoreError::DuplicateAccount(uid))
        }
        Err(e) => Err(write_failed(e)),
    }
}

/// Single `UPDATE accounts SET balance = balance + $delta WHERE uid = $uid`.
async fn increment_balance<C: ConnectionTrait>(
    conn: &C,
    uid: &str,
    delta: i64,
) -> Result<(), StoreError> {
    let result = accounts::Entity::update_many()
        .col_expr(
            accounts::Column::Balance,
            Expr::col(accounts::Column::Balance).add(delta),
        )
        .filter(accounts::Column::Uid.eq(uid))
        .exec(conn)
        .await
        .map_err(write_failed)?;

    if result.rows_affected == 0 {
        return Err(StoreError::AccountNotFound(uid.to_string()));
    }
    Ok(())
}

async fn list_entries<C: ConnectionTrait>(conn: &C) -> Result<Vec<LedgerEntry>, StoreError> {
    let rows = payments::Entity::find()
        .order_by_asc(payments::Column::Id)
        .all(conn)
        .await
        .map_err(read_failed)?;

    Ok(rows.into_iter().map(LedgerEntry::from).collect())
}

async fn insert_entry<C: ConnectionTrait>(
    conn: &C,
    entry: NewLedgerEntry,
) -> Result<LedgerEntry, StoreError> {
    let model = payments::ActiveModel {
        amount: Set(entry.amount),
        payer_account_uid: Set(entry.payer_uid),
        recipient_account_uid: Set(entry.recipient_uid),
        created_at: Set(entry.created_at.into()),
        ..Default::default()
    };

    let row = model.insert(conn).await.map_err(write_failed)?;
    Ok(row.into())
}

fn read_failed(e: DbErr) -> StoreError {
    StoreError::ReadFailed(e.to_string())
}

fn write_failed(e: DbErr) -> StoreError {
    StoreError::WriteFailed(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn account_row(id: i64, uid: &str, balance: i64) -> accounts::Model {
        accounts::Model {
            id,
            uid: uid.to_string(),
            currency: "USD".to_string(),
            balance,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_list_accounts_maps_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![account_row(1, "A", 10_000), account_row(2, "B", 0)]])
            .into_connection();
        let storage = PgStorage::new(db);

        let accounts = storage.list_accounts(None).await.unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].uid, "A");
        assert_eq!(accounts[0].balance, 10_000);
        assert_eq!(accounts[1].id, 2);
    }

    #[tokio::test]
    async fn test_list_entries_empty() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<payments::Model>::new()])
            .into_connection();
        let storage = PgStorage::new(db);

        assert!(storage.list_entries(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_increment_missing_account() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let storage = PgStorage::new(db);

        assert_eq!(
            storage.increment_balance(None, "ghost", 10).await,
            Err(StoreError::AccountNotFound("ghost".into()))
        );
    }

    #[tokio::test]
    async fn test_increment_existing_account() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let storage = PgStorage::new(db);

        assert!(storage.increment_balance(None, "A", -10).await.is_ok());
    }

    #[tokio::test]
    async fn test_read_error_is_mapped() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .into_connection();
        let storage = PgStorage::new(db);

        assert!(matches!(
            storage.list_accounts(None).await,
            Err(StoreError::ReadFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_scope_close_is_idempotent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let storage = PgStorage::new(db);

        let scope = storage.begin().await.unwrap();
        scope.commit().await.unwrap();

        assert!(scope.rollback().await.is_ok());
        assert!(scope.commit().await.is_ok());
        assert_eq!(
            storage.list_accounts(Some(&scope)).await,
            Err(StoreError::ScopeClosed)
        );
    }
}

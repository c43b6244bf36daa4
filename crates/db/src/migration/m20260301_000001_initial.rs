//! Initial database migration.
//!
//! Creates the accounts and payments tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(PAYMENTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id          BIGSERIAL PRIMARY KEY,
    uid         TEXT NOT NULL UNIQUE,
    currency    CHAR(3) NOT NULL,
    balance     BIGINT NOT NULL DEFAULT 0,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

// Rows reference accounts by uid only; no foreign keys.
const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id                      BIGSERIAL PRIMARY KEY,
    amount                  BIGINT NOT NULL,
    payer_account_uid       TEXT NOT NULL,
    recipient_account_uid   TEXT NOT NULL,
    created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_payments_payer ON payments(payer_account_uid);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS payments;
DROP TABLE IF EXISTS accounts;
";

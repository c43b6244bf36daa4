//! `SeaORM` Entity for payments table.
//!
//! Each transfer is stored as two rows: the forward leg and its mirror.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub amount: i64,
    pub payer_account_uid: String,
    pub recipient_account_uid: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for tally_core::LedgerEntry {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            amount: model.amount,
            payer_uid: model.payer_account_uid,
            recipient_uid: model.recipient_account_uid,
            created_at: model.created_at.to_utc(),
        }
    }
}

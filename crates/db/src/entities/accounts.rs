//! `SeaORM` Entity for accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub uid: String,
    #[sea_orm(column_type = "Char(Some(3))")]
    pub currency: String,
    pub balance: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for tally_core::Account {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            uid: model.uid,
            currency: model.currency,
            balance: model.balance,
            created_at: model.created_at.to_utc(),
        }
    }
}

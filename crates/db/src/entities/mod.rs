//! `SeaORM` entities.

pub mod accounts;
pub mod payments;

//! Database layer with `SeaORM` entities and the PostgreSQL store.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - [`PgStorage`], the PostgreSQL implementation of the core storage traits
//! - Connection pool setup and a liveness probe
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod pool;
pub mod store;

pub use pool::{connect, spawn_liveness_probe};
pub use store::{PgScope, PgStorage};

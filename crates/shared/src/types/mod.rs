//! Common types used across the application.

pub mod money;

pub use money::{Currency, MoneyError, from_minor_units, to_minor_units};

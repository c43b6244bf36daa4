//! Core business logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached only through the capability traits in [`store`].
//!
//! # Modules
//!
//! - `validation` - Accumulating field validation
//! - `account` - Account model and account management
//! - `ledger` - Ledger entries (forward and mirror legs)
//! - `store` - Storage capability traits and the in-memory store
//! - `transfer` - The transfer engine

pub mod account;
pub mod ledger;
pub mod store;
pub mod transfer;
pub mod validation;

pub use account::{Account, AccountError, AccountManager, CreateAccountRequest};
pub use ledger::{LedgerEntry, NewLedgerEntry};
pub use store::{AccountStore, LedgerStore, Scope, ScopeFactory, Storage, StoreError};
pub use transfer::{
    ErrorKind, TransferEngine, TransferError, TransferRequest, TransferStage, TransferStep,
};
pub use validation::{FieldViolation, ValidationError, Validator};

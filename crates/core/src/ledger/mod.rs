//! Ledger entries.
//!
//! Every transfer is stored as a forward leg and its mirror so that the
//! history of any account is simply the entries where it is the payer.

pub mod entry;

pub use entry::{LedgerEntry, NewLedgerEntry};

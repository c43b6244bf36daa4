//! The transfer engine.
//!
//! A transfer moves an amount from a payer to a recipient as one unit of
//! work: two ledger entries (the forward leg and its mirror) and two balance
//! increments, all committed together or not at all.
//!
//! # Example
//!
//! ```ignore
//! let engine = TransferEngine::new(storage, Duration::from_secs(5));
//! let entry = engine
//!     .execute(&TransferRequest::new("alice", "bob", 2500))
//!     .await?;
//! assert_eq!(entry.amount, 2500);
//! ```

pub mod engine;
pub mod error;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use engine::TransferEngine;
pub use error::{ErrorKind, TransferError};
pub use types::{TransferRequest, TransferStage, TransferStep};

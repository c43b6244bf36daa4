//! Accounts and account management.

pub mod error;
pub mod model;
pub mod service;

pub use error::AccountError;
pub use model::{Account, CreateAccountRequest, NewAccount};
pub use service::AccountManager;

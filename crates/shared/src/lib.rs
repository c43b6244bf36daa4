//! Shared configuration, errors, and money types for Tally.
//!
//! This crate provides common types used across all other crates:
//! - Currency and minor-unit conversion for the HTTP boundary
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

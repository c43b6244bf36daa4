//! API route definitions.

use axum::Router;
use tally_core::Storage;

use crate::AppState;

pub mod accounts;
pub mod health;
pub mod payments;

/// Creates the API router with all routes.
pub fn api_routes<S: Storage + 'static>() -> Router<AppState<S>> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(payments::routes())
}

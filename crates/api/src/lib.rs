//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Request and response types, with decimal amounts converted to minor
//!   units at this boundary only
//! - Mapping of domain errors to JSON error responses
//! - Recovery from handler panics into the same JSON error shape

pub mod error;
pub mod routes;

use std::any::Any as PanicPayload;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::response::Response;
use tally_core::{AccountManager, Storage, TransferEngine};
use tally_shared::AppError;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::error_response;

/// Application state shared across handlers.
pub struct AppState<S> {
    /// Account creation and listings.
    pub accounts: AccountManager<S>,
    /// Transfer execution.
    pub transfers: TransferEngine<S>,
    /// When the running binary was built.
    pub build_time: Arc<str>,
    /// Service version.
    pub version: &'static str,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            accounts: self.accounts.clone(),
            transfers: self.transfers.clone(),
            build_time: Arc::clone(&self.build_time),
            version: self.version,
        }
    }
}

impl<S: Storage> AppState<S> {
    /// Builds the state over one shared store.
    pub fn new(
        storage: Arc<S>,
        transfer_timeout: Duration,
        build_time: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            accounts: AccountManager::new(Arc::clone(&storage)),
            transfers: TransferEngine::new(storage, transfer_timeout),
            build_time: build_time.into(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Creates the main application router.
pub fn create_router<S: Storage + 'static>(state: AppState<S>) -> Router {
    with_middleware(Router::new().nest("/api/v1", routes::api_routes())).with_state(state)
}

/// Wraps `router` in panic recovery, request tracing and CORS.
///
/// Panic recovery sits innermost so the trace layer records the 500.
fn with_middleware<T>(router: Router<T>) -> Router<T>
where
    T: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Logs a handler panic and answers with the internal error envelope.
fn panic_response(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");

    error_response(
        &AppError::Internal(format!("handler panicked: {detail}")),
        "handle request",
    )
}

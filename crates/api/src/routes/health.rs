//! Server status endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tally_core::Storage;

use crate::AppState;

/// Server status response.
#[derive(Debug, Serialize)]
pub struct ServerStatusResponse {
    /// Always true while the process is serving.
    pub is_alive: bool,
    /// When the running binary was built.
    pub build_time: String,
    /// Service version.
    pub version: &'static str,
}

/// GET `/server/status`
async fn server_status<S: Storage + 'static>(
    State(state): State<AppState<S>>,
) -> Json<ServerStatusResponse> {
    Json(ServerStatusResponse {
        is_alive: true,
        build_time: state.build_time.to_string(),
        version: state.version,
    })
}

/// Creates the server status routes.
pub fn routes<S: Storage + 'static>() -> Router<AppState<S>> {
    Router::new().route("/server/status", get(server_status::<S>))
}

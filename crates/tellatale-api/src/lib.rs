//! TellaTale HTTP API.
//!
//! Exposes the story generator over axum: a buffered JSON endpoint, a
//! streaming plain-text endpoint, a health check and the bundled web page.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;

use crate::state::AppState;

/// Builds the application router. Middleware layers are added by the caller.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::index::router())
        .merge(routes::health::router())
        .merge(routes::tale::router())
        .with_state(state)
}

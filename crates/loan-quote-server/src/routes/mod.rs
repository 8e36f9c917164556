//! Route modules
//!
//! - loan: quotation endpoint
//! - health: liveness for load balancers

pub mod health;
pub mod loan;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// For uptime reporting
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            config,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the application router: all route groups, body limit and request tracing.
pub fn build_router(config: Arc<ServerConfig>) -> Router {
    let body_limit = config.max_body_bytes;
    let state = AppState::new(config);

    Router::new()
        .merge(health::routes())
        .merge(loan::routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

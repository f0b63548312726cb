//! REST API for the mastering daemon
//!
//! Three routes: job submission, status polling, and a loopback callback
//! sink for deployment smoke tests.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::jobs::JobManager;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppContext {
    /// Job registration and dispatch
    pub manager: Arc<JobManager>,
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/startProc", post(handlers::start_proc))
        .route("/getProcInfo/:id", get(handlers::get_proc_info))
        .route("/test/callback", post(handlers::test_callback))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

/// Headroom for multipart boundaries and the text fields around the file.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/analyze",
            post(handlers::handle_analyze).layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::ranking::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Criteria API
        .route(
            "/api/v1/criteria/default",
            get(handlers::handle_default_criteria),
        )
        .route(
            "/api/v1/criteria/extract",
            post(handlers::handle_extract_criteria),
        )
        // Resume API
        .route("/api/v1/resumes/score", post(handlers::handle_score_text))
        .route("/api/v1/resumes/upload", post(handlers::handle_upload_resume))
        // Ranking API
        .route("/api/v1/rankings", post(handlers::handle_rank_batch))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

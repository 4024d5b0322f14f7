use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/dashboard", get(handlers::index))
        .route("/stats", get(handlers::stats_page))
        .route("/api/stats", get(handlers::get_stats))
        .with_state(state)
}

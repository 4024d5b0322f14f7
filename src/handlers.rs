use crate::errors::AppError;
use crate::models::StatsResponse;
use crate::state::AppState;
use crate::storage::{load_stats, load_stats_or_default};
use crate::ui::{dashboard_document, render_page, stats_document};
use axum::{extract::State, http::Uri, response::Html, Json};
use chrono::Local;

pub async fn index(State(state): State<AppState>, uri: Uri) -> Html<String> {
    let stats = load_stats_or_default(&state.data_path).await;
    Html(render_page(dashboard_document(&stats), uri.path()))
}

pub async fn stats_page(State(state): State<AppState>, uri: Uri) -> Html<String> {
    let stats = load_stats_or_default(&state.data_path).await;
    Html(render_page(stats_document(&stats), uri.path()))
}

/// Re-reads the data file on every call so pollers see external updates.
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let stats = load_stats(&state.data_path).await?;
    Ok(Json(StatsResponse {
        stats,
        timestamp: Local::now().to_rfc3339(),
    }))
}

use axum::{http::StatusCode, Json};
use thiserror::Error;

use crate::dom::DomError;

/// Failures surfaced by the page components.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("stats request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("stats endpoint answered {0}")]
    Status(reqwest::StatusCode),
    #[error("stats payload could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
    #[error(transparent)]
    Dom(#[from] DomError),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

//! API error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use gavel_store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("unhealthy: {0}")]
    Unhealthy(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// JSON error envelope: `{"error": "..."}`.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            ApiError::Unhealthy(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ApiError::Server(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ApiError::Store(e) => {
                // Internal detail stays in the logs.
                tracing::error!(error = %e, "store error while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to retrieve data".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

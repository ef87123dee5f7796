use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found")]
    NotFound,

    #[error("Slot already occupied")]
    Occupied,

    #[error("Invalid placement: {0}")]
    InvalidPlacement(String),

    #[error("Class type catalog is not loaded")]
    CatalogUnavailable,

    #[error("Record store error: {0}")]
    Persistence(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::Occupied => (
                StatusCode::CONFLICT,
                "Slot already occupied".to_string(),
            ),
            AppError::InvalidPlacement(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::CatalogUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Class type catalog is not loaded".to_string(),
            ),
            AppError::Persistence(msg) => {
                error!("record store error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}

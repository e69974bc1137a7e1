use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use qsapien_types::api::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Input failed validation; `errors` lists one message per bad field.
    #[error("{message}")]
    Validation {
        message: &'static str,
        errors: Vec<String>,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation { message, errors } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    message: message.to_string(),
                    errors,
                },
            ),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    message,
                    errors: vec![],
                },
            ),
            ApiError::Database(e) => {
                tracing::error!("Database error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, internal())
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, internal())
            }
        };

        (status, Json(body)).into_response()
    }
}

fn internal() -> ErrorResponse {
    ErrorResponse {
        message: "internal server error".to_string(),
        errors: vec![],
    }
}

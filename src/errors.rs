use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::bookings::BookingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid request body: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, violations) = match self {
            AppError::Booking(BookingError::Validation(violations)) => (
                StatusCode::BAD_REQUEST,
                "validation failed".to_string(),
                Some(violations),
            ),
            AppError::Booking(BookingError::NotFound) => (
                StatusCode::NOT_FOUND,
                BookingError::NotFound.to_string(),
                None,
            ),
            AppError::Booking(BookingError::InvalidState(message)) => {
                (StatusCode::BAD_REQUEST, message, None)
            }
            AppError::Booking(BookingError::Unexpected(e)) => {
                tracing::error!(error = %e, "unexpected error handling booking request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    None,
                )
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string(), None),
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                format!("invalid request body: {message}"),
                None,
            ),
        };

        // `message` is what browser clients display; `error` is kept for API consumers.
        let mut body = serde_json::json!({ "error": message, "message": message });
        if let Some(violations) = violations {
            body["violations"] = serde_json::json!(violations);
        }

        (status, axum::Json(body)).into_response()
    }
}

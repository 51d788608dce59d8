use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use types::errors::TransferError;

/// Errors surfaced by the HTTP layer
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("Unknown platform: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            ApiError::Transfer(TransferError::ExceedsLimit { requested, limit }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "EXCEEDS_LIMIT",
                    "message": message,
                    "requested": requested,
                    "limit": limit,
                }),
            ),
            ApiError::Transfer(TransferError::InvalidAmount(_)) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "INVALID_AMOUNT", "message": message }),
            ),
            ApiError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "NOT_FOUND", "message": message }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

use crate::services::gallery_service::GalleryError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    /// The message is what the client sees; the cause is logged before
    /// the error is built.
    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    /// Maps a gallery failure onto the HTTP surface. Missing input is a 400
    /// with its own message; every downstream failure is logged and collapsed
    /// into a 500 carrying `public_message`, so callers cannot tell storage,
    /// signing and database failures apart.
    pub fn from_gallery(err: GalleryError, public_message: &str) -> Self {
        match err {
            GalleryError::Validation(msg) => AppError::BadRequest(msg),
            other => {
                tracing::error!("{}: {:?}", public_message, other);
                AppError::Internal(public_message.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

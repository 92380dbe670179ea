use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Malformed media path: {path}")]
    MalformedMediaPath { path: String },

    #[error("Media not found: {path}")]
    MediaNotFound { path: String },

    #[error("Failed to fetch media {path}: {detail}")]
    MediaUpstream { path: String, detail: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::MalformedMediaPath { .. } => StatusCode::BAD_REQUEST,
            ServerError::MediaNotFound { .. } => StatusCode::NOT_FOUND,
            ServerError::MediaUpstream { .. } | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, path) = match &self {
            ServerError::MalformedMediaPath { path } => ("Malformed media path", Some(path)),
            ServerError::MediaNotFound { path } => ("Media file not found", Some(path)),
            ServerError::MediaUpstream { path, .. } => ("Failed to fetch media", Some(path)),
            ServerError::Internal(_) => ("Internal server error", None),
        };

        let body = serde_json::json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": message,
            "status": status.as_u16(),
            "path": path,
        });

        (status, axum::Json(body)).into_response()
    }
}

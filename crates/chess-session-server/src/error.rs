//! API errors and their HTTP responses.
//!
//! Every error body is `{"error": <message>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing name parameter")]
    MissingName,

    #[error("Game not found")]
    NotFound,

    /// A failure while reading the request or updating the store; the
    /// message is logged, clients only see `public`
    #[error("{public}: {detail}")]
    Internal { public: &'static str, detail: String },
}

impl ApiError {
    pub fn internal(public: &'static str, detail: impl ToString) -> Self {
        Self::Internal {
            public,
            detail: detail.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::MissingName => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Self::Internal { public, detail } => {
                tracing::error!("{}: {}", public, detail);
                (StatusCode::INTERNAL_SERVER_ERROR, public.to_string())
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

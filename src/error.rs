use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error taxonomy.
///
/// Every fallible user action maps to one of these. All of them are
/// non-fatal: handlers report them to the caller and the in-memory
/// last-known-good state is retained.
#[derive(Debug, Error)]
pub enum AppError {
    /// The hosted store (or auth backend) could not be reached or
    /// rejected a CRUD call.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A client-side precondition was not met (empty key, missing
    /// per-language value, duplicate section, malformed input).
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Sign-in/sign-up rejected by the session gate, or a request
    /// carried no valid session.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::StoreUnavailable(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Store unavailable")
            }
            AppError::ValidationFailed(_) => (StatusCode::UNPROCESSABLE_ENTITY, "Validation error"),
            AppError::AuthFailed(_) => (StatusCode::UNAUTHORIZED, "Authentication failed"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Resource not found"),
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "details": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
